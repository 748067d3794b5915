//! Settings record value object and its fixed byte layout.
//!
//! Layout of the persisted image (all multi-byte integers little-endian):
//! ```text
//! [name:32][ssid:32][password:32][service_name:32]
//! [network_mode:1][reserved:3][address:4][port:2][reserved:2][baud_rate:4]
//! [rx_pin:1][tx_pin:1][reset_pin:1][mode_switch_pin:1][checksum:2]
//! ```
//! Total size: 150 bytes.  The layout is versionless; changing it would make
//! every stored record fail validation.

use std::fmt;
use std::net::Ipv4Addr;

/// Size of every bounded text field in bytes, including the NUL terminator.
pub const TEXT_SIZE: usize = 32;

/// Size of the persisted record image in bytes.
pub const RECORD_SIZE: usize = 150;

/// Size of the checksum trailer at the end of the image.
pub const TRAILER_SIZE: usize = 2;

/// Raw byte image of a [`SettingsRecord`] as stored in EEPROM.
pub type RecordImage = [u8; RECORD_SIZE];

/// Default TCP listen port.
pub const DEFAULT_PORT: u16 = 2345;

/// Default serial link speed.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default discovery service label.
pub const DEFAULT_SERVICE_NAME: &str = "rxtx";

/// Default access-point address.
pub const DEFAULT_ADDRESS: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 1);

// ── Layout offsets ────────────────────────────────────────────────────────────

const OFF_NAME: usize = 0;
const OFF_SSID: usize = OFF_NAME + TEXT_SIZE;
const OFF_PASSWORD: usize = OFF_SSID + TEXT_SIZE;
const OFF_SERVICE_NAME: usize = OFF_PASSWORD + TEXT_SIZE;
const OFF_NETWORK_MODE: usize = OFF_SERVICE_NAME + TEXT_SIZE; // 128
const OFF_ADDRESS: usize = OFF_NETWORK_MODE + 4; // 3 reserved bytes before
const OFF_PORT: usize = OFF_ADDRESS + 4;
const OFF_BAUD_RATE: usize = OFF_PORT + 4; // 2 reserved bytes before
const OFF_RX_PIN: usize = OFF_BAUD_RATE + 4;
const OFF_TX_PIN: usize = OFF_RX_PIN + 1;
const OFF_RESET_PIN: usize = OFF_TX_PIN + 1;
const OFF_MODE_SWITCH_PIN: usize = OFF_RESET_PIN + 1;

/// Offset of the checksum trailer; everything before it is the payload.
pub const PAYLOAD_SIZE: usize = OFF_MODE_SWITCH_PIN + 1;

const _: () = assert!(PAYLOAD_SIZE + TRAILER_SIZE == RECORD_SIZE);
// The checksum byte must land on an even offset so it carries weight 1.
const _: () = assert!(PAYLOAD_SIZE % 2 == 0);

// ── FixedText ─────────────────────────────────────────────────────────────────

/// A bounded, NUL-terminated text buffer of `N` bytes.
///
/// At most `N - 1` bytes of content are kept; longer input is silently
/// truncated.  The content ends at the first NUL byte.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedText<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> FixedText<N> {
    /// Maximum number of content bytes.
    pub const CAPACITY: usize = N - 1;

    /// Creates an empty text.
    pub const fn empty() -> Self {
        Self { bytes: [0; N] }
    }

    /// Copies `src` up to its first NUL, truncated to [`Self::CAPACITY`] bytes.
    pub fn from_bytes_truncated(src: &[u8]) -> Self {
        let content = src.split(|&b| b == 0).next().unwrap_or_default();
        let len = content.len().min(Self::CAPACITY);
        let mut bytes = [0u8; N];
        bytes[..len].copy_from_slice(&content[..len]);
        Self { bytes }
    }

    /// Wraps a raw buffer read from storage.
    ///
    /// A terminated buffer is kept byte for byte, including whatever follows
    /// the terminator.  A buffer with no NUL at all (erased or garbage
    /// storage) is not text and reads as empty.
    pub fn from_raw(bytes: [u8; N]) -> Self {
        if bytes.contains(&0) {
            Self { bytes }
        } else {
            Self::empty()
        }
    }

    /// The raw buffer, including the terminator and any trailing bytes.
    pub fn raw(&self) -> &[u8; N] {
        &self.bytes
    }

    /// Content bytes up to (not including) the first NUL.
    pub fn as_bytes(&self) -> &[u8] {
        let end = self.bytes.iter().position(|&b| b == 0).unwrap_or(N);
        &self.bytes[..end]
    }

    /// Content as text; invalid UTF-8 sequences are replaced.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes[0] == 0
    }
}

impl<const N: usize> Default for FixedText<N> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<const N: usize> From<&str> for FixedText<N> {
    fn from(value: &str) -> Self {
        Self::from_bytes_truncated(value.as_bytes())
    }
}

impl<const N: usize> fmt::Display for FixedText<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl<const N: usize> fmt::Debug for FixedText<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string_lossy())
    }
}

/// Text field type used by the record.
pub type Text = FixedText<TEXT_SIZE>;

// ── NetworkMode ───────────────────────────────────────────────────────────────

/// Which radio roles the device takes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum NetworkMode {
    Off = 0,
    #[default]
    Station = 1,
    AccessPoint = 2,
    StationAndAccessPoint = 3,
}

impl NetworkMode {
    /// All modes in persisted-value order.
    pub const ALL: [NetworkMode; 4] = [
        NetworkMode::Off,
        NetworkMode::Station,
        NetworkMode::AccessPoint,
        NetworkMode::StationAndAccessPoint,
    ];

    pub fn from_persisted(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    pub fn as_persisted(self) -> u8 {
        self as u8
    }

    pub fn includes_station(self) -> bool {
        matches!(self, Self::Station | Self::StationAndAccessPoint)
    }

    pub fn includes_access_point(self) -> bool {
        matches!(self, Self::AccessPoint | Self::StationAndAccessPoint)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Station => "station",
            Self::AccessPoint => "access point",
            Self::StationAndAccessPoint => "station + access point",
        }
    }
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Pins ──────────────────────────────────────────────────────────────────────

/// A wired GPIO pin number (0..=127).
///
/// There is deliberately no way to build a `PinId` from the "no pin"
/// sentinel, so GPIO calls can only ever receive a real pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinId(u8);

impl PinId {
    pub const MAX: u8 = i8::MAX as u8;

    pub fn new(id: u8) -> Option<Self> {
        (id <= Self::MAX).then_some(Self(id))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An optional pin assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Pin {
    /// Not wired.  Persisted as `-1`.
    #[default]
    None,
    Id(PinId),
}

impl Pin {
    /// Raw value persisted for [`Pin::None`].
    pub const SENTINEL: i8 = -1;

    /// Converts a persisted value; any negative value means "no pin".
    pub fn from_raw(raw: i8) -> Self {
        u8::try_from(raw)
            .ok()
            .and_then(PinId::new)
            .map_or(Pin::None, Pin::Id)
    }

    /// Converts operator input.  Values below zero mean "no pin"; values
    /// above [`PinId::MAX`] are rejected.
    pub fn from_input(value: i64) -> Option<Self> {
        if value < 0 {
            return Some(Pin::None);
        }
        u8::try_from(value).ok().and_then(PinId::new).map(Pin::Id)
    }

    pub fn to_raw(self) -> i8 {
        match self {
            Pin::None => Self::SENTINEL,
            // PinId::MAX fits in i8.
            Pin::Id(id) => id.get() as i8,
        }
    }

    pub fn id(self) -> Option<PinId> {
        match self {
            Pin::None => None,
            Pin::Id(id) => Some(id),
        }
    }

    pub fn is_wired(self) -> bool {
        matches!(self, Pin::Id(_))
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pin::None => f.write_str("-1 (none)"),
            Pin::Id(id) => write!(f, "{id}"),
        }
    }
}

/// How the bridge reaches the serial device, derived from the rx/tx pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialLink {
    /// The device's default hardware UART.
    Hardware,
    /// A software-emulated UART on the given pins.
    Software { rx: PinId, tx: Pin },
}

impl fmt::Display for SerialLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerialLink::Hardware => f.write_str("hw"),
            SerialLink::Software { rx, tx } => write!(f, "sw:{rx}/{}", tx.to_raw()),
        }
    }
}

// ── SettingsRecord ────────────────────────────────────────────────────────────

/// All persistent operating parameters of the device.
///
/// Every setter clears the checksum trailer, so a record only reads as
/// checksummed after [`crate::settings::integrity::update`] has run on the
/// current field values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsRecord {
    name: Text,
    ssid: Text,
    password: Text,
    service_name: Text,
    network_mode: NetworkMode,
    address: Ipv4Addr,
    port: u16,
    baud_rate: u32,
    rx_pin: Pin,
    tx_pin: Pin,
    reset_pin: Pin,
    mode_switch_pin: Pin,
    checksum: [u8; TRAILER_SIZE],
}

impl Default for SettingsRecord {
    /// Compiled-in defaults with an empty (unchecksummed) trailer.
    fn default() -> Self {
        Self {
            name: Text::empty(),
            ssid: Text::empty(),
            password: Text::empty(),
            service_name: Text::from(DEFAULT_SERVICE_NAME),
            network_mode: NetworkMode::default(),
            address: DEFAULT_ADDRESS,
            port: DEFAULT_PORT,
            baud_rate: DEFAULT_BAUD_RATE,
            rx_pin: Pin::None,
            tx_pin: Pin::None,
            reset_pin: Pin::None,
            mode_switch_pin: Pin::None,
            checksum: [0; TRAILER_SIZE],
        }
    }
}

impl SettingsRecord {
    /// Decodes a stored image.  Never fails: terminated text is kept
    /// verbatim, unterminated text reads as empty, an unknown network-mode
    /// byte decodes as [`NetworkMode::Off`] and any pin below `-1` as
    /// [`Pin::None`].
    ///
    /// Validity must be judged on the image itself with
    /// [`crate::settings::integrity::check_image`].  Decoding is not
    /// injective: an image with nonzero reserved bytes, unterminated text,
    /// an out-of-range mode or a pin below `-1` re-encodes to different
    /// bytes, so the decoded record no longer passes
    /// [`crate::settings::integrity::check`] even though the image did.
    pub fn from_image(image: &RecordImage) -> Self {
        Self {
            name: Text::from_raw(text_at(image, OFF_NAME)),
            ssid: Text::from_raw(text_at(image, OFF_SSID)),
            password: Text::from_raw(text_at(image, OFF_PASSWORD)),
            service_name: Text::from_raw(text_at(image, OFF_SERVICE_NAME)),
            network_mode: NetworkMode::from_persisted(image[OFF_NETWORK_MODE])
                .unwrap_or(NetworkMode::Off),
            address: Ipv4Addr::from(u32::from_le_bytes(array_at(image, OFF_ADDRESS))),
            port: u16::from_le_bytes(array_at(image, OFF_PORT)),
            baud_rate: u32::from_le_bytes(array_at(image, OFF_BAUD_RATE)),
            rx_pin: Pin::from_raw(image[OFF_RX_PIN] as i8),
            tx_pin: Pin::from_raw(image[OFF_TX_PIN] as i8),
            reset_pin: Pin::from_raw(image[OFF_RESET_PIN] as i8),
            mode_switch_pin: Pin::from_raw(image[OFF_MODE_SWITCH_PIN] as i8),
            checksum: array_at(image, PAYLOAD_SIZE),
        }
    }

    /// Encodes the record, trailer included, into its persisted image.
    pub fn to_image(&self) -> RecordImage {
        let mut image = [0u8; RECORD_SIZE];
        image[OFF_NAME..OFF_NAME + TEXT_SIZE].copy_from_slice(self.name.raw());
        image[OFF_SSID..OFF_SSID + TEXT_SIZE].copy_from_slice(self.ssid.raw());
        image[OFF_PASSWORD..OFF_PASSWORD + TEXT_SIZE].copy_from_slice(self.password.raw());
        image[OFF_SERVICE_NAME..OFF_SERVICE_NAME + TEXT_SIZE]
            .copy_from_slice(self.service_name.raw());
        image[OFF_NETWORK_MODE] = self.network_mode.as_persisted();
        image[OFF_ADDRESS..OFF_ADDRESS + 4].copy_from_slice(&u32::from(self.address).to_le_bytes());
        image[OFF_PORT..OFF_PORT + 2].copy_from_slice(&self.port.to_le_bytes());
        image[OFF_BAUD_RATE..OFF_BAUD_RATE + 4].copy_from_slice(&self.baud_rate.to_le_bytes());
        image[OFF_RX_PIN] = self.rx_pin.to_raw() as u8;
        image[OFF_TX_PIN] = self.tx_pin.to_raw() as u8;
        image[OFF_RESET_PIN] = self.reset_pin.to_raw() as u8;
        image[OFF_MODE_SWITCH_PIN] = self.mode_switch_pin.to_raw() as u8;
        image[PAYLOAD_SIZE..].copy_from_slice(&self.checksum);
        image
    }

    /// Restores every field to its compiled-in default and clears the trailer.
    pub fn reset_to_defaults(&mut self) {
        *self = Self::default();
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn name(&self) -> &Text {
        &self.name
    }
    pub fn ssid(&self) -> &Text {
        &self.ssid
    }
    pub fn password(&self) -> &Text {
        &self.password
    }
    pub fn service_name(&self) -> &Text {
        &self.service_name
    }
    pub fn network_mode(&self) -> NetworkMode {
        self.network_mode
    }
    pub fn address(&self) -> Ipv4Addr {
        self.address
    }
    pub fn port(&self) -> u16 {
        self.port
    }
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }
    pub fn rx_pin(&self) -> Pin {
        self.rx_pin
    }
    pub fn tx_pin(&self) -> Pin {
        self.tx_pin
    }
    pub fn reset_pin(&self) -> Pin {
        self.reset_pin
    }
    pub fn mode_switch_pin(&self) -> Pin {
        self.mode_switch_pin
    }

    /// The two trailer bytes: `[checksum, magic]`.
    pub fn checksum_trailer(&self) -> [u8; TRAILER_SIZE] {
        self.checksum
    }

    /// Hardware UART when no rx pin is wired, otherwise a software UART.
    pub fn serial_link(&self) -> SerialLink {
        match self.rx_pin {
            Pin::None => SerialLink::Hardware,
            Pin::Id(rx) => SerialLink::Software {
                rx,
                tx: self.tx_pin,
            },
        }
    }

    // ── Mutators (each invalidates the trailer) ───────────────────────────────

    pub fn set_name(&mut self, name: impl Into<Text>) {
        self.name = name.into();
        self.invalidate();
    }
    pub fn set_ssid(&mut self, ssid: impl Into<Text>) {
        self.ssid = ssid.into();
        self.invalidate();
    }
    pub fn set_password(&mut self, password: impl Into<Text>) {
        self.password = password.into();
        self.invalidate();
    }
    pub fn set_service_name(&mut self, service_name: impl Into<Text>) {
        self.service_name = service_name.into();
        self.invalidate();
    }
    pub fn set_network_mode(&mut self, mode: NetworkMode) {
        self.network_mode = mode;
        self.invalidate();
    }
    pub fn set_address(&mut self, address: Ipv4Addr) {
        self.address = address;
        self.invalidate();
    }
    pub fn set_port(&mut self, port: u16) {
        self.port = port;
        self.invalidate();
    }
    pub fn set_baud_rate(&mut self, baud_rate: u32) {
        self.baud_rate = baud_rate;
        self.invalidate();
    }
    pub fn set_rx_pin(&mut self, pin: Pin) {
        self.rx_pin = pin;
        self.invalidate();
    }
    pub fn set_tx_pin(&mut self, pin: Pin) {
        self.tx_pin = pin;
        self.invalidate();
    }
    pub fn set_reset_pin(&mut self, pin: Pin) {
        self.reset_pin = pin;
        self.invalidate();
    }
    pub fn set_mode_switch_pin(&mut self, pin: Pin) {
        self.mode_switch_pin = pin;
        self.invalidate();
    }

    pub(crate) fn set_checksum_trailer(&mut self, trailer: [u8; TRAILER_SIZE]) {
        self.checksum = trailer;
    }

    fn invalidate(&mut self) {
        self.checksum = [0; TRAILER_SIZE];
    }
}

fn text_at(image: &RecordImage, offset: usize) -> [u8; TEXT_SIZE] {
    array_at(image, offset)
}

fn array_at<const N: usize>(image: &RecordImage, offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&image[offset..offset + N]);
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
