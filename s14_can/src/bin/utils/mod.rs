pub mod setup_can;
