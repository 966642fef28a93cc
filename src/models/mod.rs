// Wire model for the Portainer / Docker Engine API

/// Defines an enum carried on the wire as an integer (`"Status": 1`).
///
/// Values outside the listed set fail to decode with serde's
/// `unknown variant` error, the same as string enums.
macro_rules! int_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident = $value:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant = $value),+
        }

        impl $name {
            const WIRE_VALUES: &'static [&'static str] = &[$(stringify!($value)),+];

            /// Raw wire value.
            pub fn as_wire(self) -> u8 {
                self as u8
            }

            /// Parses a raw wire value; `None` when unrecognized.
            pub fn from_wire(value: i64) -> Option<Self> {
                match value {
                    $($value => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_u8(self.as_wire())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                struct WireVisitor;

                impl serde::de::Visitor<'_> for WireVisitor {
                    type Value = $name;

                    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                        write!(f, "an integer {}", stringify!($name))
                    }

                    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<$name, E> {
                        $name::from_wire(v)
                            .ok_or_else(|| E::unknown_variant(&v.to_string(), $name::WIRE_VALUES))
                    }

                    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<$name, E> {
                        i64::try_from(v)
                            .ok()
                            .and_then($name::from_wire)
                            .ok_or_else(|| E::unknown_variant(&v.to_string(), $name::WIRE_VALUES))
                    }
                }

                deserializer.deserialize_i64(WireVisitor)
            }
        }
    };
}

mod container;
mod endpoint;
mod network;
mod preferences;
mod stack;
mod storage;

pub use container::{
    Container, ContainerConfig, ContainerDetails, ContainerHealth, ContainerState,
    ContainerStatus, ExecuteAction, GraphDriver, GraphDriverData, HealthConfig, HostConfig,
    LogConfig, RestartPolicy, UnknownStatus, status_rank,
};
pub use endpoint::{
    AccessPolicy, AzureCredentials, DockerSnapshot, Endpoint, EndpointExtension, EndpointId,
    EndpointStatus, EndpointType, KubernetesConfiguration, KubernetesData,
    KubernetesIngressClassConfig, KubernetesSnapshot, KubernetesStorageClassConfig, Motd,
    TlsConfiguration,
};
pub use network::{IpamConfig, Network, NetworkSettings, Port, PortBinding, PortType};
pub use preferences::Preferences;
pub use stack::{Stack, StackId, StackStatus, StackType};
pub use storage::{
    BindOptions, DriverConfig, Mount, MountConsistency, MountPoint, MountType, Propagation,
    TmpfsOptions, VolumeOptions,
};
