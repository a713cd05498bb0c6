use crate::config::CONFIG;

/// Path of the redemption endpoint
pub const REDEEM_PATH: &str = "/enrol/invitation/redeem";

/// Builds absolute links to pages of the site
#[derive(Debug, Clone)]
pub struct SiteLinks {
    site_url: String,
    site_name: String,
}

impl SiteLinks {
    pub fn new(site_url: impl Into<String>, site_name: impl Into<String>) -> Self {
        Self {
            site_url: site_url.into().trim_end_matches('/').to_string(),
            site_name: site_name.into(),
        }
    }

    pub fn from_config() -> Self {
        Self::new(&CONFIG.site.site_url, &CONFIG.site.site_name)
    }

    pub fn site_name(&self) -> &str {
        &self.site_name
    }

    pub fn site_url(&self) -> String {
        format!("{}/", self.site_url)
    }

    /// Link carried by an invitation email
    pub fn redeem_url(&self, token: &str, course_id: i64) -> String {
        format!(
            "{}{}?token={}&id={}",
            self.site_url,
            REDEEM_PATH,
            urlencoding::encode(token),
            course_id
        )
    }

    pub fn course_url(&self, course_id: i64) -> String {
        format!("{}/course/view?id={}", self.site_url, course_id)
    }

    pub fn enrolled_users_url(&self, course_id: i64) -> String {
        format!("{}/enrol/users?id={}", self.site_url, course_id)
    }

    /// Instance edit page; without an instance id it creates a new instance
    pub fn edit_instance_url(&self, course_id: i64, instance_id: Option<i64>) -> String {
        match instance_id {
            Some(id) => format!(
                "{}/enrol/invitation/edit?courseid={}&id={}",
                self.site_url, course_id, id
            ),
            None => format!("{}/enrol/invitation/edit?courseid={}", self.site_url, course_id),
        }
    }

    pub fn invite_users_url(&self, course_id: i64, instance_id: i64) -> String {
        format!(
            "{}/enrol/invitation/invitation?courseid={}&id={}",
            self.site_url, course_id, instance_id
        )
    }

    pub fn unenrol_user_url(&self, course_id: i64, user_enrolment_id: i64) -> String {
        format!(
            "{}/enrol/invitation/unenroluser?id={}&ue={}",
            self.site_url, course_id, user_enrolment_id
        )
    }

    pub fn edit_enrolment_url(&self, course_id: i64, user_enrolment_id: i64) -> String {
        format!(
            "{}/enrol/invitation/editenrolment?id={}&ue={}",
            self.site_url, course_id, user_enrolment_id
        )
    }
}
