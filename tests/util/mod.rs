pub use failing_sink::FailingSink;
pub use simple_channel::SimpleChannel;

pub mod failing_sink;
pub mod simple_channel;
