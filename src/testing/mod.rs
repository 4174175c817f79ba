pub mod ports;

#[allow(unused_imports)]
pub use ports::FakeRepository;
#[allow(unused_imports)]
pub use ports::FetchGate;
#[allow(unused_imports)]
pub use ports::MemoryRegistryStore;
#[allow(unused_imports)]
pub use ports::StaticCredentials;
