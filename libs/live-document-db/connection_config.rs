use typed_builder::TypedBuilder;

#[derive(TypedBuilder)]
pub struct ConnectionConfig {
    pub database_name: String,
    /// A volatile database is not registered globally: every connection
    /// built with this flag gets a private store. Used by tests.
    #[builder(default = false)]
    pub volatile: bool,
}
