use crate::clock::{self, Clock};
use crate::config::{AddressMode, ChipSelect, StaticConfig, DEFAULT_RETRY_INTERVAL};
use crate::interface::NetworkInterface;
use crate::net::{Ipv4Addr, MacAddress};

/// Connection lifecycle as reported by [`ConnectionManager::poll`].
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NetState {
    Disconnected,
    /// Only held while an attempt runs inside `poll`, never returned from it.
    Connecting,
    Connected,
}

/// Handler registered with [`ConnectionManager::on_connect`] or
/// [`ConnectionManager::on_disconnect`].
pub type Callback<'a> = &'a mut dyn FnMut();

/// Keeps an Ethernet interface connected from a cooperative main loop.
///
/// Call [`poll`](Self::poll) on every iteration of the loop. While
/// disconnected it retries the configured addressing mode every
/// `retry_interval` milliseconds; while connected it maintains the DHCP lease
/// and watches the physical link.
///
/// ```
/// use core::cell::Cell;
/// use ethernet_manager::{
///     ChipSelect, ConnectionManager, Ipv4Addr, LeaseStatus, MacAddress, NetState,
///     NetworkInterface, StaticConfig,
/// };
///
/// struct Loopback;
///
/// impl NetworkInterface for Loopback {
///     type Client = ();
///     fn initialize(&mut self, _: ChipSelect) {}
///     fn begin_dhcp(&mut self, _: MacAddress) -> bool { true }
///     fn begin_static(&mut self, _: MacAddress, _: &StaticConfig) {}
///     fn maintain_lease(&mut self) -> LeaseStatus { LeaseStatus::Nothing }
///     fn link_is_up(&mut self) -> bool { true }
///     fn local_address(&mut self) -> Ipv4Addr { Ipv4Addr::new(10, 0, 0, 7) }
///     fn client(&mut self) -> &mut () { Box::leak(Box::new(())) }
/// }
///
/// let millis = Cell::new(0_u32);
/// let connected = Cell::new(false);
/// let mut on_connect = || connected.set(true);
///
/// let mac = MacAddress::new(0xDE, 0xAD, 0xBE, 0xEF, 0xFE, 0xED);
/// let mut manager = ConnectionManager::new(Loopback, || millis.get(), mac, ChipSelect(10));
/// manager.on_connect(&mut on_connect);
/// manager.configure_dhcp();
///
/// assert_eq!(manager.poll(), NetState::Connected);
/// assert!(connected.get());
/// ```
pub struct ConnectionManager<'a, I: NetworkInterface, C: Clock> {
    interface: I,
    clock: C,
    mac: MacAddress,
    chip_select: ChipSelect,
    mode: AddressMode,
    retry_interval: u32,
    last_attempt: u32,
    state: NetState,
    on_connect: Option<Callback<'a>>,
    on_disconnect: Option<Callback<'a>>,
}

impl<'a, I: NetworkInterface, C: Clock> ConnectionManager<'a, I, C> {
    /// Starts out disconnected in DHCP mode with the default retry interval.
    ///
    /// The hardware is not touched until one of the `configure_*` methods is
    /// called.
    pub fn new(interface: I, clock: C, mac: MacAddress, chip_select: ChipSelect) -> Self {
        ConnectionManager {
            interface,
            clock,
            mac,
            chip_select,
            mode: AddressMode::Dhcp,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            last_attempt: 0,
            state: NetState::Disconnected,
            on_connect: None,
            on_disconnect: None,
        }
    }

    /// Obtain the address via DHCP. The next `poll` attempts a connection.
    pub fn configure_dhcp(&mut self) {
        self.configure(AddressMode::Dhcp);
        info!("Initialized for DHCP");
    }

    /// Use a fixed address. The next `poll` attempts a connection.
    pub fn configure_static(&mut self, config: StaticConfig) {
        self.configure(AddressMode::Static(config));
        info!("Initialized for static IP: {}", config);
    }

    fn configure(&mut self, mode: AddressMode) {
        self.mode = mode;
        self.last_attempt = self
            .clock
            .now_millis()
            .wrapping_sub(self.retry_interval);
        self.interface.initialize(self.chip_select);
    }

    /// Advances the state machine by one step and returns the resulting state,
    /// which is never [`NetState::Connecting`].
    pub fn poll(&mut self) -> NetState {
        let previous = self.state;

        match self.state {
            NetState::Disconnected => {
                let since = clock::elapsed(self.clock.now_millis(), self.last_attempt);
                if since >= self.retry_interval {
                    self.state = NetState::Connecting;
                    self.connect();
                }
            }
            // resolved by connect() before poll returns
            NetState::Connecting => {}
            NetState::Connected => {
                let lease = self.interface.maintain_lease();
                if lease.is_failure() {
                    warn!("DHCP lease lost: {}", lease);
                    self.state = NetState::Disconnected;
                }

                if !self.interface.link_is_up() {
                    warn!("Physical link lost");
                    self.state = NetState::Disconnected;
                }
            }
        }

        if self.state != previous {
            match (previous, self.state) {
                (_, NetState::Connected) => {
                    if let Some(callback) = self.on_connect.as_deref_mut() {
                        callback();
                    }
                }
                (NetState::Connected, NetState::Disconnected) => {
                    if let Some(callback) = self.on_disconnect.as_deref_mut() {
                        callback();
                    }
                    self.last_attempt = self.clock.now_millis();
                }
                _ => {}
            }
        }

        self.state
    }

    fn connect(&mut self) {
        self.last_attempt = self.clock.now_millis();

        self.state = match self.mode {
            AddressMode::Static(config) => {
                debug!("Attempting connection, mode: static");
                self.interface.begin_static(self.mac, &config);
                if self.interface.link_is_up() {
                    info!("Static configuration applied, link up");
                    NetState::Connected
                } else {
                    debug!("Static configuration applied, link down");
                    NetState::Disconnected
                }
            }
            AddressMode::Dhcp => {
                debug!("Attempting connection, mode: DHCP");
                let leased = self.interface.begin_dhcp(self.mac);
                let address = self.interface.local_address();
                if leased && address != Ipv4Addr::UNSPECIFIED {
                    let [a, b, c, d] = address.octets();
                    info!("DHCP connection successful, IP: {}.{}.{}.{}", a, b, c, d);
                    NetState::Connected
                } else {
                    warn!("DHCP connection failed");
                    NetState::Disconnected
                }
            }
        };
    }

    pub fn is_connected(&self) -> bool {
        self.state == NetState::Connected
    }

    pub fn state(&self) -> NetState {
        self.state
    }

    /// TCP client of the underlying interface, for application traffic.
    pub fn client(&mut self) -> &mut I::Client {
        self.interface.client()
    }

    /// Minimum time between connection attempts while disconnected.
    pub fn set_retry_interval(&mut self, millis: u32) {
        self.retry_interval = millis;
    }

    pub fn retry_interval(&self) -> u32 {
        self.retry_interval
    }

    /// Replaces any previously registered connect handler.
    pub fn on_connect(&mut self, callback: Callback<'a>) {
        self.on_connect = Some(callback);
    }

    /// Replaces any previously registered disconnect handler.
    pub fn on_disconnect(&mut self, callback: Callback<'a>) {
        self.on_disconnect = Some(callback);
    }

    pub fn mode(&self) -> &AddressMode {
        &self.mode
    }

    pub fn mac(&self) -> MacAddress {
        self.mac
    }

    pub fn chip_select(&self) -> ChipSelect {
        self.chip_select
    }

    pub fn interface(&self) -> &I {
        &self.interface
    }

    pub fn interface_mut(&mut self) -> &mut I {
        &mut self.interface
    }

    pub fn release(self) -> (I, C) {
        (self.interface, self.clock)
    }
}
