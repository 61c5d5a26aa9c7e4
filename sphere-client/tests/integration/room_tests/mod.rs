pub mod test_admin_actions;
pub mod test_kicked_and_disconnects;
