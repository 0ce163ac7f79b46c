pub mod upload_server;
