//! Room directory: which connections receive which broadcasts.

pub mod directory;
pub mod key;
pub mod room;
pub mod subscription;

pub use directory::RoomDirectory;
pub use key::RoomKey;
