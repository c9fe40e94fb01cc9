pub mod dispatcher;

pub use dispatcher::ClusterDispatcher;
