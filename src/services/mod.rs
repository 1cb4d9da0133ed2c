pub mod accounts;
pub mod content;

pub use accounts::AccountService;
pub use content::ContentService;
