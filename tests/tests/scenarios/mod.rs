mod offline;
mod preload;
mod upload;
