//! CrudService: repository selection, field hashing, credential verification.

mod crud;
mod factory;
mod hasher;
pub use crud::{parse_field_list, CrudService, Credentials};
pub use factory::RepositoryFactory;
pub use hasher::{BcryptHasher, PasswordHasher, BCRYPT_COST};
