use crate::error::ApiError;

/// Usernames follow the same shape as community names: 3-21 characters,
/// letters/digits/underscores only.
pub fn validate_register_user_details(username: &str, password: &str) -> Result<(), ApiError> {
    if username.len() < 3 || username.len() > 21 {
        return Err(ApiError::input_field(
            "Username should be 3 to 21 characters",
            "username",
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ApiError::input_field(
            "Username can only contain letters, numbers and underscores",
            "username",
        ));
    }
    if password.len() < 8 {
        return Err(ApiError::input_field(
            "Password should be at least 8 characters",
            "password",
        ));
    }
    Ok(())
}

pub fn validate_login_user_details(username: &str, password: &str) -> Result<(), ApiError> {
    if username.is_empty() {
        return Err(ApiError::input_field("username is required", "username"));
    }
    if password.is_empty() {
        return Err(ApiError::input_field("password is required", "password"));
    }
    Ok(())
}

pub fn validate_update_user_args(profile_pic: &str) -> Result<(), ApiError> {
    if profile_pic.is_empty() {
        return Err(ApiError::input_field("profilePic is required", "profilePic"));
    }
    Ok(())
}

pub fn validate_get_user_details_args(username: &str) -> Result<(), ApiError> {
    if username.is_empty() {
        return Err(ApiError::input_field("username is required", "username"));
    }
    Ok(())
}
