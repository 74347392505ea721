use crate::dummyjson::{CommentUser, User};

pub const CLOSE_LABEL: &str = "[ Close ]";

/// Contact fields shown in the detail popup. Built either from a canonical
/// user or from a comment's embedded reference, in which case the fields the
/// reference lacks stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDetails {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub image: String,
}

impl From<&User> for UserDetails {
    fn from(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            image: user.image.clone(),
        }
    }
}

impl From<&CommentUser> for UserDetails {
    fn from(reference: &CommentUser) -> Self {
        let (first_name, last_name) = match reference.full_name.as_deref() {
            Some(full) => match full.split_once(' ') {
                Some((first, last)) => (first.to_string(), last.to_string()),
                None => (full.to_string(), String::new()),
            },
            None => (String::new(), String::new()),
        };
        Self {
            first_name,
            last_name,
            username: reference.username.clone(),
            ..Default::default()
        }
    }
}

impl UserDetails {
    pub fn heading(&self) -> String {
        format!("{} {} ({})", self.first_name, self.last_name, self.username)
    }

    pub fn lines(&self) -> Vec<String> {
        vec![
            self.heading(),
            String::new(),
            format!("Email: {}", self.email),
            format!("Phone: {}", self.phone),
            format!("Image: {}", self.image),
            String::new(),
            CLOSE_LABEL.to_string(),
        ]
    }
}

#[derive(Debug, Default)]
pub struct Popup {
    details: Option<UserDetails>,
}

impl Popup {
    /// Replaces whatever the popup showed before.
    pub fn show(&mut self, details: UserDetails) {
        self.details = Some(details);
    }

    pub fn dismiss(&mut self) {
        self.details = None;
    }

    pub fn is_visible(&self) -> bool {
        self.details.is_some()
    }

    pub fn details(&self) -> Option<&UserDetails> {
        self.details.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(username: &str) -> User {
        User {
            id: 1,
            first_name: "Emily".into(),
            last_name: "Johnson".into(),
            username: username.into(),
            email: "emily@x.dummyjson.com".into(),
            phone: "+81 965-431-3024".into(),
            image: "https://dummyjson.com/icon/emilys/128".into(),
        }
    }

    #[test]
    fn second_show_replaces_first() {
        let mut popup = Popup::default();
        popup.show(UserDetails::from(&user("emilys")));
        popup.show(UserDetails::from(&user("michaelw")));
        let details = popup.details().unwrap();
        assert_eq!(details.username, "michaelw");
        assert_eq!(
            details.lines().iter().filter(|line| line.contains("Email")).count(),
            1
        );
    }

    #[test]
    fn dismiss_hides() {
        let mut popup = Popup::default();
        popup.show(UserDetails::from(&user("emilys")));
        assert!(popup.is_visible());
        popup.dismiss();
        assert!(!popup.is_visible());
    }

    #[test]
    fn partial_reference_renders_empty_fields() {
        let details = UserDetails::from(&CommentUser {
            id: 105,
            username: "emmac".into(),
            full_name: None,
        });
        let lines = details.lines();
        assert_eq!(lines[0], "  (emmac)");
        assert_eq!(lines[2], "Email: ");
        assert_eq!(lines[3], "Phone: ");
    }

    #[test]
    fn full_name_splits_on_first_space() {
        let details = UserDetails::from(&CommentUser {
            id: 105,
            username: "emmac".into(),
            full_name: Some("Emma Mae Wilson".into()),
        });
        assert_eq!(details.first_name, "Emma");
        assert_eq!(details.last_name, "Mae Wilson");
    }
}
