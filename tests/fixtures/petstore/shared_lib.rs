/// Bookkeeping shared by stored entities
pub struct Record {
    pub id: String,
    pub owner: Owner,
    pub revision: u32,
}

pub struct Owner {
    pub name: String,
}
