pub mod data_directory;
