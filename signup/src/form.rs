//! The sign-up form.

use formwork::prelude::*;
use log::{debug, info};
use serde_json::json;

use crate::customer::Customer;
use crate::error::Result;

/// Accepted shape of an email address. Lowercase only.
pub const EMAIL_PATTERN: &str = "[a-z0-9._%+-]+@[a-z0-9.-]+";

/// Longest accepted last name, in characters.
pub const LAST_NAME_MAX: usize = 25;

/// Inclusive bounds of the rating.
pub const RATING_MIN: f64 = 2.0;
pub const RATING_MAX: f64 = 5.0;

/// Template of one address entry.
pub fn address_schema() -> GroupSchema {
    GroupSchema::new()
        .value("addressType", "home")
        .value("street1", "")
        .value("street2", "")
        .value("city", "")
        .value("state", "")
        .value("zip", "")
}

/// Schema of the whole form.
pub fn schema() -> formwork::Result<GroupSchema> {
    let email_group = GroupSchema::new()
        .field(
            "email",
            FieldSchema::new("").required().pattern(EMAIL_PATTERN)?,
        )
        .field("confirmEmail", FieldSchema::new("").required())
        .validator(GroupValidator::fields_match("email", "confirmEmail"));

    Ok(GroupSchema::new()
        .field("firstName", FieldSchema::new("").required())
        .field(
            "lastName",
            FieldSchema::new("").required().max_length(LAST_NAME_MAX),
        )
        .group("emailGroup", email_group)
        .value("phone", "")
        .value("notification", "email")
        .field(
            "rating",
            FieldSchema::new("").range(RATING_MIN, RATING_MAX),
        )
        .value("sendCatalog", true)
        .array("addresses", ArraySchema::new(address_schema()).with_len(1)))
}

/// Messages shown under the email input.
pub fn email_messages() -> ValidationMessageTable {
    ValidationMessageTable::new()
        .with(ErrorKind::Required, "Please enter your email address")
        .with(ErrorKind::Pattern, "Please enter a valid email address")
}

/// Phone becomes required when notifications go out by text.
pub fn notification_policy() -> formwork::Result<LinkedPolicy> {
    Ok(LinkedPolicy::new("notification", "phone")?.when("text", vec![Validator::required()]))
}

/// Patch used by the test-data actions.
///
/// `email` sits at the top level here while the form keeps it under
/// `emailGroup`, so the patch leaves the email untouched.
fn test_data(send_catalog: bool) -> serde_json::Value {
    json!({
        "firstName": "Jack",
        "lastName": "Harkness",
        "email": "rbcadaing@gmail.com",
        "sendCatalog": send_catalog
    })
}

/// Sign-up form with its watchers attached.
///
/// Handles to every control are resolved once at construction. Dropping the
/// form drops its watchers and cancels a pending email message update.
///
/// # Example
///
/// ```
/// use formwork::{FormConfig, notify::Scheduler};
/// use signup::SignupForm;
///
/// let (scheduler, _clock) = Scheduler::manual();
/// let form = SignupForm::new(&scheduler, FormConfig::default()).unwrap();
///
/// form.populate_test_data();
/// assert_eq!(form.first_name().value(), "Jack".into());
/// assert!(form.save().contains("\"lastName\":\"Harkness\""));
/// ```
#[derive(Debug)]
pub struct SignupForm {
    form: GroupControl,
    first_name: FieldControl,
    last_name: FieldControl,
    email_group: GroupControl,
    email: FieldControl,
    confirm_email: FieldControl,
    phone: FieldControl,
    notification: FieldControl,
    rating: FieldControl,
    send_catalog: FieldControl,
    addresses: ArrayControl,
    email_message: State<String>,
    config: FormConfig,
    _watchers: Vec<Subscription>,
}

impl SignupForm {
    /// Builds the form and attaches the notification policy and the
    /// debounced email message watcher.
    pub fn new(scheduler: &Scheduler, config: FormConfig) -> Result<Self> {
        let form = schema()?.build()?;

        let mut watchers = PolicyTable::new()
            .with(notification_policy()?)
            .attach_all(&form)?;

        let email = form.field("emailGroup.email")?;
        let email_message = State::new(String::new());
        let message = email_message.clone();
        let table = email_messages();
        let visibility = config.message_visibility;
        watchers.push(email.debounce_value_changes(
            scheduler,
            config.debounce,
            move |snapshot| {
                let text = table.message_for_field(snapshot, visibility);
                debug!("Email message: {:?}", text);
                message.set(text);
            },
        ));

        let signup = Self {
            first_name: form.field("firstName")?,
            last_name: form.field("lastName")?,
            email_group: form.group("emailGroup")?,
            email,
            confirm_email: form.field("emailGroup.confirmEmail")?,
            phone: form.field("phone")?,
            notification: form.field("notification")?,
            rating: form.field("rating")?,
            send_catalog: form.field("sendCatalog")?,
            addresses: form.array("addresses")?,
            form,
            email_message,
            config,
            _watchers: watchers,
        };
        info!("Sign-up form ready (debounce {:?})", signup.config.debounce);
        Ok(signup)
    }

    /// Root group.
    pub fn form(&self) -> &GroupControl {
        &self.form
    }

    pub fn first_name(&self) -> &FieldControl {
        &self.first_name
    }

    pub fn last_name(&self) -> &FieldControl {
        &self.last_name
    }

    pub fn email_group(&self) -> &GroupControl {
        &self.email_group
    }

    pub fn email(&self) -> &FieldControl {
        &self.email
    }

    pub fn confirm_email(&self) -> &FieldControl {
        &self.confirm_email
    }

    pub fn phone(&self) -> &FieldControl {
        &self.phone
    }

    pub fn notification(&self) -> &FieldControl {
        &self.notification
    }

    pub fn rating(&self) -> &FieldControl {
        &self.rating
    }

    pub fn send_catalog(&self) -> &FieldControl {
        &self.send_catalog
    }

    pub fn addresses(&self) -> &ArrayControl {
        &self.addresses
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    /// Message for the email input as of the last debounce expiry.
    pub fn email_message(&self) -> String {
        self.email_message.get()
    }

    /// Selects how notifications are sent (`"email"` or `"text"`).
    pub fn set_notification(&self, via: &str) {
        self.notification.set_value(via);
    }

    /// Fills in sample data.
    pub fn populate_test_data(&self) {
        info!("Populating test data");
        self.form.patch_value(&test_data(false));
    }

    /// Re-applies the sample data with `sendCatalog` flipped.
    pub fn toggle_send_catalog(&self) {
        let current = self.send_catalog.value().as_bool().unwrap_or(false);
        debug!("Toggling sendCatalog from {}", current);
        self.form.patch_value(&test_data(!current));
    }

    /// Appends an empty address and returns it.
    pub fn add_address(&self) -> GroupControl {
        let address = self.addresses.push();
        info!("Added address #{}", self.addresses.len());
        address
    }

    /// Every invalid control with a generic message.
    pub fn validate(&self) -> ValidationResult {
        self.form.validate(&ValidationMessageTable::defaults())
    }

    /// Logs the form and returns its value as compact JSON.
    pub fn save(&self) -> String {
        debug!("{:?}", self.form);
        let saved = self.form.to_value().to_string();
        info!("Saved: {}", saved);
        saved
    }

    /// Reads the current value as a [`Customer`].
    pub fn customer(&self) -> Result<Customer> {
        Ok(serde_json::from_value(self.form.to_value())?)
    }
}
