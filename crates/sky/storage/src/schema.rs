//! Diesel schema definitions.

diesel::table! {
    users (id) {
        id -> Text,
        username -> Nullable<Text>,
        email -> Nullable<Text>,
        password -> Binary,
        auth -> Text,
    }
}

diesel::table! {
    user_roles (user_id, role_id) {
        user_id -> Text,
        role_id -> Text,
    }
}

diesel::table! {
    roles (id) {
        id -> Text,
        is_admin -> Bool,
        by_default -> Bool,
    }
}

diesel::table! {
    devices (id) {
        id -> Text,
        #[sql_name = "type"]
        device_type -> Text,
        token -> Text,
        user_id -> Nullable<Text>,
        last_registered_at -> Timestamp,
    }
}

diesel::joinable!(user_roles -> users (user_id));
diesel::joinable!(user_roles -> roles (role_id));

diesel::allow_tables_to_appear_in_same_query!(users, user_roles, roles, devices);
