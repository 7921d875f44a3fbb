mod error;
mod gateway;
mod init;
mod routers;

pub use init::setup_router;
