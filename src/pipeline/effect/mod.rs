pub mod leveler;
pub mod silence;

pub use leveler::Leveler;
pub use silence::Silence;
