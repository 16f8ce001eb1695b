//! Caller-facing lifecycle requests.

use thiserror::Error;

use super::wire::{CreatePayload, Disc, IpSpec, Machine, Reimage};

/// Distribution label that provisions a machine without an operating
/// system. Such machines cannot receive SSH key material and are never
/// probed for SSH reachability.
pub const NO_OS_DISTRIBUTION: &str = "none";

const DEFAULT_DISTRIBUTION: &str = "bookworm";
const DEFAULT_DISC_GRADE: &str = "sata";
const DEFAULT_DISC_SIZE_MIB: u32 = 25600;
const ROOT_DISC_LABEL: &str = "root";

/// Errors raised while validating lifecycle requests.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum RequestError {
    /// Raised when a request is missing a required field.
    #[error("missing or empty field: {0}")]
    Validation(String),
}

/// Parameters for creating a machine.
///
/// Core count and memory may each be left at zero to have the capacity rule
/// derive them from the other side; addresses may be supplied explicitly or
/// left for the remote side to allocate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreateRequest {
    /// Machine name; immutable after creation.
    pub name: String,
    /// Requested core count; zero derives it from `memory`.
    pub cores: u32,
    /// Requested memory in MiB; zero derives it from `cores`.
    pub memory: u32,
    /// Whether creation waits for the machine to report power.
    pub power_on: bool,
    /// Group override; the configured default applies when absent.
    pub group: Option<String>,
    /// Zone override; the configured default applies when absent.
    pub zone: Option<String>,
    /// Distribution to image the root disc with.
    pub distribution: String,
    /// Root disc size in MiB.
    pub disc_size: u32,
    /// Root disc storage grade.
    pub disc_grade: String,
    /// Explicit IPv4 address; omitted to let the remote side allocate.
    pub ipv4: Option<String>,
    /// Explicit IPv6 address; omitted to let the remote side allocate.
    pub ipv6: Option<String>,
    /// SSH public key material installed during imaging.
    pub ssh_public_key: Option<String>,
    /// Script executed on first boot.
    pub firstboot_script: Option<String>,
}

impl CreateRequest {
    /// Starts a builder for a [`CreateRequest`].
    #[must_use]
    pub fn builder() -> CreateRequestBuilder {
        CreateRequestBuilder::new()
    }

    /// Validates the request, returning a descriptive error when a required
    /// field is missing.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Validation`] naming the offending field.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.name.trim().is_empty() {
            return Err(RequestError::Validation(String::from("name")));
        }
        if self.distribution.trim().is_empty() {
            return Err(RequestError::Validation(String::from("distribution")));
        }
        if self.disc_size == 0 {
            return Err(RequestError::Validation(String::from("disc_size")));
        }
        Ok(())
    }

    /// Builds the creation envelope from reconciled capacity values, the
    /// generated root password, and the resolved zone.
    pub(crate) fn to_payload(
        &self,
        cores: u32,
        memory: u32,
        root_password: &str,
        zone: &str,
    ) -> CreatePayload {
        let ips = if self.ipv4.is_none() && self.ipv6.is_none() {
            None
        } else {
            Some(IpSpec {
                ipv4: self.ipv4.clone(),
                ipv6: self.ipv6.clone(),
            })
        };

        CreatePayload {
            virtual_machine: Machine {
                id: None,
                name: self.name.clone(),
                cores,
                memory,
                power_on: Some(self.power_on),
                autoreboot_on: Some(self.power_on),
                group_id: None,
                zone_name: Some(zone.to_owned()),
                last_imaged_with: None,
            },
            discs: vec![Disc {
                label: String::from(ROOT_DISC_LABEL),
                storage_grade: self.disc_grade.clone(),
                size: self.disc_size,
            }],
            reimage: Reimage {
                distribution: self.distribution.clone(),
                root_password: root_password.to_owned(),
                ssh_public_key: self.ssh_public_key.clone(),
                firstboot_script: self.firstboot_script.clone(),
            },
            ips,
        }
    }
}

/// Builder for [`CreateRequest`] carrying the creation defaults.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreateRequestBuilder {
    request: CreateRequest,
}

impl Default for CreateRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CreateRequestBuilder {
    /// Creates a builder with the creation defaults applied.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request: CreateRequest {
                name: String::new(),
                cores: 0,
                memory: 0,
                power_on: true,
                group: None,
                zone: None,
                distribution: String::from(DEFAULT_DISTRIBUTION),
                disc_size: DEFAULT_DISC_SIZE_MIB,
                disc_grade: String::from(DEFAULT_DISC_GRADE),
                ipv4: None,
                ipv6: None,
                ssh_public_key: None,
                firstboot_script: None,
            },
        }
    }

    /// Sets the machine name.
    #[must_use]
    pub fn name(mut self, value: impl Into<String>) -> Self {
        self.request.name = value.into();
        self
    }

    /// Sets the requested core count.
    #[must_use]
    pub fn cores(mut self, value: u32) -> Self {
        self.request.cores = value;
        self
    }

    /// Sets the requested memory in MiB.
    #[must_use]
    pub fn memory(mut self, value: u32) -> Self {
        self.request.memory = value;
        self
    }

    /// Sets whether creation waits for power.
    #[must_use]
    pub fn power_on(mut self, value: bool) -> Self {
        self.request.power_on = value;
        self
    }

    /// Sets the group override.
    #[must_use]
    pub fn group(mut self, value: Option<String>) -> Self {
        self.request.group = value;
        self
    }

    /// Sets the zone override.
    #[must_use]
    pub fn zone(mut self, value: Option<String>) -> Self {
        self.request.zone = value;
        self
    }

    /// Sets the distribution to image with.
    #[must_use]
    pub fn distribution(mut self, value: impl Into<String>) -> Self {
        self.request.distribution = value.into();
        self
    }

    /// Sets the root disc size in MiB.
    #[must_use]
    pub fn disc_size(mut self, value: u32) -> Self {
        self.request.disc_size = value;
        self
    }

    /// Sets the root disc storage grade.
    #[must_use]
    pub fn disc_grade(mut self, value: impl Into<String>) -> Self {
        self.request.disc_grade = value.into();
        self
    }

    /// Sets the explicit IPv4 address.
    #[must_use]
    pub fn ipv4(mut self, value: Option<String>) -> Self {
        self.request.ipv4 = value;
        self
    }

    /// Sets the explicit IPv6 address.
    #[must_use]
    pub fn ipv6(mut self, value: Option<String>) -> Self {
        self.request.ipv6 = value;
        self
    }

    /// Sets the SSH public key installed during imaging.
    #[must_use]
    pub fn ssh_public_key(mut self, value: Option<String>) -> Self {
        self.request.ssh_public_key = value;
        self
    }

    /// Sets the first-boot script.
    #[must_use]
    pub fn firstboot_script(mut self, value: Option<String>) -> Self {
        self.request.firstboot_script = value;
        self
    }

    /// Builds and validates the [`CreateRequest`], trimming the name.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Validation`] when a required field is empty.
    pub fn build(mut self) -> Result<CreateRequest, RequestError> {
        self.request.name = self.request.name.trim().to_owned();
        self.request.validate()?;
        Ok(self.request)
    }
}

/// Field groups an update may change; absent groups are left untouched on
/// the remote side.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct UpdateRequest {
    /// New core count; reconciled together with `memory` before submission.
    pub cores: Option<u32>,
    /// New memory in MiB; reconciled together with `cores` before
    /// submission.
    pub memory: Option<u32>,
    /// Explicit power intent; overrides the power cycle a resize implies.
    pub power_on: Option<bool>,
    /// Explicit auto-reboot intent.
    pub reboot: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::{CreateRequest, NO_OS_DISTRIBUTION, RequestError};

    #[test]
    fn builder_applies_creation_defaults() {
        let request = CreateRequest::builder()
            .name("web1")
            .build()
            .unwrap_or_else(|err| panic!("defaults should validate: {err}"));
        assert_eq!(request.distribution, "bookworm");
        assert_eq!(request.disc_size, 25600);
        assert_eq!(request.disc_grade, "sata");
        assert!(request.power_on);
        assert_eq!(request.cores, 0);
    }

    #[test]
    fn build_rejects_blank_names() {
        let err = CreateRequest::builder()
            .name("   ")
            .build()
            .expect_err("blank name should be rejected");
        assert_eq!(err, RequestError::Validation(String::from("name")));
    }

    #[test]
    fn payload_wraps_machine_disc_and_reimage() {
        let request = CreateRequest::builder()
            .name("web1")
            .ssh_public_key(Some(String::from("ssh-ed25519 AAAA test")))
            .build()
            .unwrap_or_else(|err| panic!("request should validate: {err}"));
        let payload = request.to_payload(2, 8192, "sekrit", "york");
        let rendered = serde_json::to_value(&payload)
            .unwrap_or_else(|err| panic!("payload should serialise: {err}"));

        assert_eq!(rendered["virtual_machine"]["name"], "web1");
        assert_eq!(rendered["virtual_machine"]["cores"], 2);
        assert_eq!(rendered["virtual_machine"]["memory"], 8192);
        assert_eq!(rendered["virtual_machine"]["zone_name"], "york");
        assert_eq!(rendered["discs"][0]["label"], "root");
        assert_eq!(rendered["reimage"]["root_password"], "sekrit");
        assert_eq!(rendered["reimage"]["ssh_public_key"], "ssh-ed25519 AAAA test");
        assert!(
            rendered.get("ips").is_none(),
            "ips must be omitted when no explicit address is requested"
        );
        assert!(
            rendered["virtual_machine"].get("id").is_none(),
            "the identifier is remote-assigned"
        );
    }

    #[test]
    fn payload_carries_explicit_addresses() {
        let request = CreateRequest::builder()
            .name("web1")
            .ipv4(Some(String::from("192.0.2.11")))
            .build()
            .unwrap_or_else(|err| panic!("request should validate: {err}"));
        let payload = request.to_payload(1, 1024, "sekrit", "york");
        let rendered = serde_json::to_value(&payload)
            .unwrap_or_else(|err| panic!("payload should serialise: {err}"));

        assert_eq!(rendered["ips"]["ipv4"], "192.0.2.11");
        assert!(rendered["ips"].get("ipv6").is_none());
    }

    #[test]
    fn no_os_marker_is_the_reserved_label() {
        assert_eq!(NO_OS_DISTRIBUTION, "none");
    }
}
