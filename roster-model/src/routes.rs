macro_rules! v1_path {
    ($path:literal) => {
        concat!("/api/v1", $path)
    };
}

/// Versioned API route definitions shared by the server and its clients
pub mod v1 {
    pub const ROOT: &str = "/api/v1";
    pub const VERSION: &str = "v1";

    pub mod me {
        pub const CURRENT: &str = v1_path!("/me");
        pub const ROLE_SYNC: &str = v1_path!("/me/role/sync");
    }

    pub mod onboarding {
        pub const COMPLETE: &str = v1_path!("/onboarding");
        pub const AGENCIES: &str = v1_path!("/onboarding/agencies");
    }

    pub mod setup {
        pub const BOOTSTRAP: &str = v1_path!("/setup/bootstrap");
    }

    pub mod webhooks {
        pub const IDENTITY: &str = v1_path!("/webhooks/identity");
    }

    pub mod agencies {
        pub const COLLECTION: &str = v1_path!("/agencies");
        pub const ITEM: &str = v1_path!("/agencies/{id}");
        pub const MEMBERS: &str = v1_path!("/agencies/{id}/members");
    }

    pub mod members {
        pub const COLLECTION: &str = v1_path!("/members");
        pub const ITEM: &str = v1_path!("/members/{id}");
        pub const ROLE: &str = v1_path!("/members/{id}/role");
    }

    pub mod activity {
        pub const COLLECTION: &str = v1_path!("/activity");
    }

    pub mod dashboard {
        pub const SUMMARY: &str = v1_path!("/dashboard");
    }

    pub mod admin {
        pub const DIAGNOSTICS: &str = v1_path!("/admin/diagnostics");
        pub const MEMBER_ROLE_REPAIR: &str =
            v1_path!("/admin/members/{id}/role");
    }
}

/// Helper utilities for working with route templates
pub mod utils {
    /// Replace a single path parameter (e.g. `"{id}"`) with the provided value.
    pub fn replace_param(
        route: &str,
        param: &str,
        value: impl AsRef<str>,
    ) -> String {
        route.replace(param, value.as_ref())
    }

    /// Append query parameters to the provided route.
    pub fn with_query(route: &str, params: &[(&str, &str)]) -> String {
        if params.is_empty() {
            return route.to_string();
        }

        let query = params
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("{route}?{query}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_versioned() {
        assert_eq!(v1::agencies::ITEM, "/api/v1/agencies/{id}");
        assert_eq!(
            utils::replace_param(v1::members::ROLE, "{id}", "abc"),
            "/api/v1/members/abc/role"
        );
        assert_eq!(
            utils::with_query(v1::members::COLLECTION, &[("status", "ACTIVE")]),
            "/api/v1/members?status=ACTIVE"
        );
    }
}
