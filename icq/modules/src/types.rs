/// Response to a read-only module query, see [`crate::context::Module::query`].
pub struct QueryResult {
    pub data: Vec<u8>,
}
