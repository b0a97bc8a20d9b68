pub(crate) const DEFAULT_LISTEN: &str = "127.0.0.1:5000";
pub(crate) const DEFAULT_PEER_TIMEOUT_SECS: u64 = 5;
pub(crate) const DEFAULT_REWARD_AMOUNT: u64 = 1;
pub(crate) const MINED_MESSAGE: &str = "Congratulations, you just mined a block!";
pub(crate) const MISSING_TX_FIELDS: &str = "Some elements of the transaction are missing!";
pub(crate) const MISSING_NODES: &str = "No nodes in request to add to network";
pub(crate) const NODES_ADDED: &str = "Successfully added nodes to network";
