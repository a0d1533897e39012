mod user_dto;

pub use user_dto::{ChangeRoleDto, CreateUserDto, UserResponseDto};
