//! Database models.

use diesel::prelude::*;

use crate::schema::{devices, roles, user_roles, users};

/// User record.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
pub struct UserRow {
    pub id: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Vec<u8>,
    pub auth: String,
}

/// New user for insertion.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub id: &'a str,
    pub username: Option<&'a str>,
    pub email: Option<&'a str>,
    pub password: &'a [u8],
    pub auth: &'a str,
}

/// Role membership for insertion.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_roles)]
pub struct NewUserRole<'a> {
    pub user_id: &'a str,
    pub role_id: &'a str,
}

/// Role for insertion.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = roles)]
pub struct NewRole<'a> {
    pub id: &'a str,
    pub is_admin: bool,
    pub by_default: bool,
}

/// Device record.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = devices)]
pub struct DeviceRow {
    pub id: String,
    pub device_type: String,
    pub token: String,
    pub user_id: Option<String>,
    pub last_registered_at: chrono::NaiveDateTime,
}

/// New device for insertion.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = devices)]
pub struct NewDevice<'a> {
    pub id: &'a str,
    pub device_type: &'a str,
    pub token: &'a str,
    pub user_id: Option<&'a str>,
    pub last_registered_at: chrono::NaiveDateTime,
}

impl From<DeviceRow> for sky_core::Device {
    fn from(row: DeviceRow) -> Self {
        Self {
            id: row.id,
            device_type: row.device_type,
            token: row.token,
            user_id: row.user_id,
            last_registered_at: row.last_registered_at.and_utc(),
        }
    }
}

impl<'a> From<&'a sky_core::Device> for NewDevice<'a> {
    fn from(device: &'a sky_core::Device) -> Self {
        Self {
            id: &device.id,
            device_type: &device.device_type,
            token: &device.token,
            user_id: device.user_id.as_deref(),
            last_registered_at: device.last_registered_at.naive_utc(),
        }
    }
}
