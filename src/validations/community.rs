use crate::error::ApiError;

/// Community names are 3-21 characters, letters/digits/underscores only.
pub fn validate_create_community_details(name: &str, description: &str) -> Result<(), ApiError> {
    if name.len() < 3 || name.len() > 21 {
        return Err(ApiError::input_field(
            "Community name should be 3 to 21 characters",
            "name",
        ));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ApiError::input_field(
            "Community name can only contain letters, numbers and underscores",
            "name",
        ));
    }
    if description.len() < 10 {
        return Err(ApiError::input_field(
            "Description should be at least 10 characters",
            "description",
        ));
    }
    Ok(())
}

pub fn validate_get_community_details_args(name: &str) -> Result<(), ApiError> {
    if name.is_empty() {
        return Err(ApiError::input_field("name is required", "name"));
    }
    Ok(())
}

pub fn validate_update_community_args(community_id: &str) -> Result<(), ApiError> {
    if community_id.is_empty() {
        return Err(ApiError::input_field("communityId is required", "communityId"));
    }
    Ok(())
}

pub fn validate_join_community_args(community_id: &str) -> Result<(), ApiError> {
    if community_id.is_empty() {
        return Err(ApiError::input_field("communityId is required", "communityId"));
    }
    Ok(())
}

pub fn validate_leave_community_args(community_id: &str) -> Result<(), ApiError> {
    if community_id.is_empty() {
        return Err(ApiError::input_field("communityId is required", "communityId"));
    }
    Ok(())
}
