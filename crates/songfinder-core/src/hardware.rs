//! Vocabulary of asynchronous hardware notifications.

use std::fmt;

/// Why the platform changed the active audio route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteChangeReason {
    /// The session category changed.
    CategoryChange,
    /// A new device became available, e.g. headphones were plugged in.
    NewDeviceAvailable,
    /// The device in use went away, e.g. headphones were unplugged.
    OldDeviceUnavailable,
    /// The route was overridden.
    Override,
    /// The device woke from sleep.
    WakeFromSleep,
    /// No route suits the current category.
    NoSuitableRoute,
    /// A device's configuration (not its identity) changed.
    RouteConfigurationChange,
    /// The platform did not say.
    Unknown,
}

impl fmt::Display for RouteChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RouteChangeReason::CategoryChange => "categoryChange",
            RouteChangeReason::NewDeviceAvailable => "newDeviceAvailable",
            RouteChangeReason::OldDeviceUnavailable => "oldDeviceUnavailable",
            RouteChangeReason::Override => "override",
            RouteChangeReason::WakeFromSleep => "wakeFromSleep",
            RouteChangeReason::NoSuitableRoute => "noSuitableRouteForCategory",
            RouteChangeReason::RouteConfigurationChange => "routeConfigurationChange",
            RouteChangeReason::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Start or end of an audio interruption (phone call, alarm, another app).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptionPhase {
    /// The interruption began; the session lost the hardware.
    Began,
    /// The interruption ended.
    Ended,
}

/// Physical orientation of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceOrientation {
    /// Upright, home edge down.
    Portrait,
    /// Upside down.
    PortraitUpsideDown,
    /// Rotated so the home edge is on the right.
    LandscapeLeft,
    /// Rotated so the home edge is on the left.
    LandscapeRight,
    /// Lying flat, screen up.
    FaceUp,
    /// Lying flat, screen down.
    FaceDown,
    /// Not known.
    Unknown,
}

/// Orientation hint for a stereo microphone capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StereoOrientation {
    /// Portrait capture.
    Portrait,
    /// Upside-down portrait capture.
    PortraitUpsideDown,
    /// Landscape capture, left variant.
    LandscapeLeft,
    /// Landscape capture, right variant.
    LandscapeRight,
}

impl StereoOrientation {
    /// Stereo capture orientation matching a device orientation.
    ///
    /// The landscape cases cross over: the two enumerations name landscape
    /// from opposite points of view. Flat or unknown orientations give no hint.
    pub fn for_device(orientation: DeviceOrientation) -> Option<Self> {
        match orientation {
            DeviceOrientation::Portrait => Some(StereoOrientation::Portrait),
            DeviceOrientation::PortraitUpsideDown => Some(StereoOrientation::PortraitUpsideDown),
            DeviceOrientation::LandscapeLeft => Some(StereoOrientation::LandscapeRight),
            DeviceOrientation::LandscapeRight => Some(StereoOrientation::LandscapeLeft),
            DeviceOrientation::FaceUp | DeviceOrientation::FaceDown | DeviceOrientation::Unknown => {
                None
            }
        }
    }
}

/// Pickup pattern of a microphone data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolarPattern {
    /// Single-channel omnidirectional capture.
    Omnidirectional,
    /// Spatial two-channel capture.
    Stereo,
}
