pub mod aci;
pub mod principal;

pub use aci::Entity as Aci;
pub use principal::Entity as Principal;
