use crate::server::response::ApiError;

const MAX_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 254;
const MIN_PASSWORD_LEN: usize = 8;
const MAX_LINK_BATCH: usize = 200;

fn validate_len(value: &str, field: &str, max_len: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} is required"));
    }
    if value.chars().count() > max_len {
        return Err(format!("{field} cannot exceed {max_len} characters"));
    }
    Ok(())
}

pub fn validate_account_name(name: &str) -> Result<(), ApiError> {
    validate_len(name, "name", MAX_NAME_LEN).map_err(ApiError::bad_request)
}

pub fn validate_email(email: &str) -> Result<(), ApiError> {
    validate_len(email, "email", MAX_EMAIL_LEN).map_err(ApiError::bad_request)?;

    let valid = email
        .trim()
        .split_once('@')
        .is_some_and(|(local, host)| !local.is_empty() && host.contains('.') && !host.contains('@'));
    if !valid {
        return Err(ApiError::bad_request("email is invalid"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.is_empty() {
        return Err(ApiError::bad_request("password is required"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Result<(), ApiError> {
    validate_len(title, "title", MAX_NAME_LEN * 2).map_err(ApiError::bad_request)
}

pub fn validate_link_batch(media_ids: &[String]) -> Result<(), ApiError> {
    if media_ids.is_empty() {
        return Err(ApiError::bad_request("media_ids must not be empty"));
    }
    if media_ids.len() > MAX_LINK_BATCH {
        return Err(ApiError::bad_request(format!(
            "cannot link more than {MAX_LINK_BATCH} media at once"
        )));
    }
    if media_ids.iter().any(|id| id.trim().is_empty()) {
        return Err(ApiError::bad_request("media_ids cannot contain empty ids"));
    }
    Ok(())
}

/// Accepts `#rgb` or `#rrggbb`.
pub fn validate_color(color: &str) -> Result<(), ApiError> {
    let valid = color
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()));
    if !valid {
        return Err(ApiError::bad_request("primary_color must be a hex color"));
    }
    Ok(())
}
