//! MySQL/MariaDB driver implementation

mod connection;
mod driver;
mod literal;

pub use connection::MySqlConnection;
pub use driver::MySqlDriver;
pub use literal::{bind_params, value_to_mysql_literal};
