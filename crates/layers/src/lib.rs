pub mod symbology;
pub mod zones;

pub use symbology::*;
pub use zones::*;
