pub mod async_support;
