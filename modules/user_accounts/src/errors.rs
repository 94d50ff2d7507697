//! Error catalog for the user_accounts module.
//!
//! Every problem returned over HTTP carries one of these codes.

use http_problem::{ErrDef, Problem};

macro_rules! catalog {
    ($( $variant:ident => ($status:literal, $title:literal, $code:literal) ),+ $(,)?) => {
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum ErrorCode {
            $( $variant ),+
        }

        impl ErrorCode {
            pub const ALL: &'static [ErrorCode] = &[ $( ErrorCode::$variant ),+ ];

            pub const fn def(&self) -> ErrDef {
                match self {
                    $( ErrorCode::$variant => ErrDef {
                        status: $status,
                        title: $title,
                        code: $code,
                        type_url: concat!("https://errors.example.com/", $code),
                    } ),+
                }
            }
        }
    };
}

catalog! {
    user_accounts_user_not_found_v1 => (404, "User Not Found", "user_accounts.user.not_found.v1"),
    user_accounts_user_email_conflict_v1 => (409, "Email Already Exists", "user_accounts.user.email_conflict.v1"),
    user_accounts_user_invalid_email_v1 => (400, "Invalid Email", "user_accounts.user.invalid_email.v1"),
    user_accounts_user_invalid_role_v1 => (400, "Invalid Role", "user_accounts.user.invalid_role.v1"),
    user_accounts_user_validation_v1 => (400, "Validation Failed", "user_accounts.user.validation.v1"),
    user_accounts_auth_invalid_credentials_v1 => (401, "Invalid Credentials", "user_accounts.auth.invalid_credentials.v1"),
    user_accounts_auth_unauthenticated_v1 => (401, "Unauthenticated", "user_accounts.auth.unauthenticated.v1"),
    user_accounts_access_wrong_role_v1 => (403, "Forbidden", "user_accounts.access.wrong_role.v1"),
    user_accounts_access_not_owner_v1 => (403, "Forbidden", "user_accounts.access.not_owner.v1"),
    user_accounts_access_operation_not_permitted_v1 => (403, "Forbidden", "user_accounts.access.operation_not_permitted.v1"),
    user_accounts_access_self_deletion_v1 => (403, "Forbidden", "user_accounts.access.self_deletion.v1"),
    user_accounts_internal_database_v1 => (500, "Internal Database Error", "user_accounts.internal.database.v1"),
    user_accounts_internal_v1 => (500, "Internal Error", "user_accounts.internal.v1"),
}

impl ErrorCode {
    pub fn status(&self) -> u16 {
        self.def().status
    }

    pub fn to_problem(&self, detail: impl Into<String>) -> Problem {
        self.def().to_problem(detail)
    }
}
