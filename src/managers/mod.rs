// Acme state managers
// Managers own mutable browser state: the tab and bookmark collections and the page on screen.

pub mod page_tracker;
pub mod session_store;
