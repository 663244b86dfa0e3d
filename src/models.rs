use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;
use crate::model::staff::StaffProfile;

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "4821")]
    pub pin: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Seconds until the token expires. The session itself also ends after
    /// a period of inactivity.
    #[schema(example = 43200)]
    pub expires_in: usize,
    pub role: Role,
    pub staff: StaffProfile,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Portal staff id
    pub sub: String,
    pub name: String,
    pub role: Role,
    pub exp: usize,
    /// Session key
    pub jti: String,
}
