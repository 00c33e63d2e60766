use bit_field::BitArray;
use embedded_nal::{SocketAddr, SocketAddrV4, TcpClientStack, TcpError, TcpErrorKind};

use crate::{bus::Bus, register::socketn, socket::Socket};

/// First port of the IANA dynamic range, used for outgoing connections.
const EPHEMERAL_PORT_START: u16 = 49152;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TcpSocketError<E: core::fmt::Debug> {
    NoMoreSockets,
    NotReady,
    UnsupportedAddress,
    UnsupportedMode,
    /// The peer did not answer or reset the connection attempt.
    ConnectionFailed,
    Other(E),
}

impl<E: core::fmt::Debug> From<E> for TcpSocketError<E> {
    fn from(e: E) -> Self {
        TcpSocketError::Other(e)
    }
}

impl<E: core::fmt::Debug> TcpError for TcpSocketError<E> {
    fn kind(&self) -> TcpErrorKind {
        match self {
            TcpSocketError::NotReady => TcpErrorKind::PipeClosed,
            _ => TcpErrorKind::Other,
        }
    }
}

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TcpSocket {
    socket: Socket,
    /// Source port of the current connection attempt.
    local_port: u16,
    connecting: bool,
    sending: bool,
}

impl TcpSocket {
    fn open<B: Bus>(&mut self, bus: &mut B, local_port: u16) -> Result<(), TcpSocketError<B::Error>> {
        self.socket.command(bus, socketn::Command::Close)?;
        self.socket.reset_interrupt(bus, socketn::Interrupt::All)?;
        self.socket.set_source_port(bus, local_port)?;
        self.socket.set_mode(bus, socketn::Protocol::Tcp)?;
        self.socket.set_interrupt_mask(
            bus,
            socketn::Interrupt::SendOk as u8 | socketn::Interrupt::Timeout as u8,
        )?;
        self.socket.command(bus, socketn::Command::Open)?;
        self.sending = false;
        Ok(())
    }

    fn close<B: Bus>(&mut self, bus: &mut B) -> Result<(), TcpSocketError<B::Error>> {
        self.socket.set_mode(bus, socketn::Protocol::Closed)?;
        self.socket.command(bus, socketn::Command::Close)?;
        self.connecting = false;
        self.sending = false;
        Ok(())
    }

    fn poll_connect<B: Bus>(
        &mut self,
        bus: &mut B,
        remote: SocketAddrV4,
    ) -> nb::Result<(), TcpSocketError<B::Error>> {
        match self.socket.status(bus).map_err(TcpSocketError::Other)? {
            Ok(socketn::Status::Established) => {
                self.connecting = false;
                Ok(())
            }

            // accepted, and the peer already sent its FIN; buffered data is still readable
            Ok(socketn::Status::CloseWait) if self.connecting => {
                self.connecting = false;
                Ok(())
            }

            // INIT until the chip processes CONNECT
            Ok(socketn::Status::Init) | Ok(socketn::Status::SynSent) | Ok(socketn::Status::SynRecv)
                if self.connecting =>
            {
                Err(nb::Error::WouldBlock)
            }

            // ARP or SYN timeout, or a RST from the peer
            Ok(socketn::Status::Closed) if self.connecting => {
                self.connecting = false;
                Err(nb::Error::Other(TcpSocketError::ConnectionFailed))
            }

            Err(_) | Ok(socketn::Status::MacRaw) | Ok(socketn::Status::Udp) => {
                Err(nb::Error::Other(TcpSocketError::UnsupportedMode))
            }

            Ok(_) => {
                self.open(bus, self.local_port)?;
                self.socket
                    .set_destination_ip(bus, *remote.ip())
                    .map_err(TcpSocketError::Other)?;
                self.socket
                    .set_destination_port(bus, remote.port())
                    .map_err(TcpSocketError::Other)?;
                self.socket
                    .command(bus, socketn::Command::Connect)
                    .map_err(TcpSocketError::Other)?;
                self.connecting = true;
                Err(nb::Error::WouldBlock)
            }
        }
    }

    pub fn is_connected<B: Bus>(&self, bus: &mut B) -> Result<bool, TcpSocketError<B::Error>> {
        Ok(self.socket.status(bus)? == Ok(socketn::Status::Established))
    }

    fn send<B: Bus>(&mut self, bus: &mut B, data: &[u8]) -> nb::Result<usize, TcpSocketError<B::Error>> {
        if !self.is_connected(bus)? {
            return Err(nb::Error::Other(TcpSocketError::NotReady));
        }
        if data.is_empty() {
            return Ok(0);
        }

        // the chip accepts a new SEND only after the previous one completed
        if self.sending {
            if self
                .socket
                .has_interrupt(bus, socketn::Interrupt::SendOk)
                .map_err(TcpSocketError::Other)?
            {
                self.socket
                    .reset_interrupt(bus, socketn::Interrupt::SendOk)
                    .map_err(TcpSocketError::Other)?;
                self.sending = false;
            } else {
                return Err(nb::Error::WouldBlock);
            }
        }

        let max_size = self.socket.get_tx_free_size(bus).map_err(TcpSocketError::Other)? as usize;
        if max_size == 0 {
            return Err(nb::Error::WouldBlock);
        }
        let write_data = &data[..data.len().min(max_size)];

        let write_pointer = self
            .socket
            .get_tx_write_pointer(bus)
            .map_err(TcpSocketError::Other)?;
        bus.write_frame(self.socket.tx_buffer(), write_pointer, write_data)
            .map_err(TcpSocketError::Other)?;
        self.socket
            .set_tx_write_pointer(bus, write_pointer.wrapping_add(write_data.len() as u16))
            .map_err(TcpSocketError::Other)?;

        self.socket
            .command(bus, socketn::Command::Send)
            .map_err(TcpSocketError::Other)?;
        self.sending = true;

        Ok(write_data.len())
    }

    fn receive<B: Bus>(
        &mut self,
        bus: &mut B,
        data: &mut [u8],
    ) -> nb::Result<usize, TcpSocketError<B::Error>> {
        match self.socket.status(bus).map_err(TcpSocketError::Other)? {
            // the peer may have closed with data still buffered
            Ok(socketn::Status::Established) | Ok(socketn::Status::CloseWait) => {}
            _ => return Err(nb::Error::Other(TcpSocketError::NotReady)),
        }

        let rx_size = self.socket.get_receive_size(bus).map_err(TcpSocketError::Other)? as usize;
        if rx_size == 0 {
            return Err(nb::Error::WouldBlock);
        }

        let len = rx_size.min(data.len());
        let read_buffer = &mut data[..len];

        let read_pointer = self
            .socket
            .get_rx_read_pointer(bus)
            .map_err(TcpSocketError::Other)?;
        bus.read_frame(self.socket.rx_buffer(), read_pointer, read_buffer)
            .map_err(TcpSocketError::Other)?;
        self.socket
            .set_rx_read_pointer(bus, read_pointer.wrapping_add(len as u16))
            .map_err(TcpSocketError::Other)?;

        self.socket
            .command(bus, socketn::Command::Receive)
            .map_err(TcpSocketError::Other)?;
        self.socket
            .reset_interrupt(bus, socketn::Interrupt::Receive)
            .map_err(TcpSocketError::Other)?;

        Ok(len)
    }
}

/// TCP client over the W5500's hardware sockets.
pub struct TcpClient<SpiBus: Bus> {
    pub(crate) bus: SpiBus,
    sockets: [u8; 1],
    next_port: u16,
}

impl<SpiBus: Bus> TcpClient<SpiBus> {
    pub(crate) fn new(bus: SpiBus) -> Self {
        TcpClient {
            bus,
            sockets: [0b11111111],
            next_port: EPHEMERAL_PORT_START,
        }
    }

    pub(crate) fn release(self) -> SpiBus {
        self.bus
    }

    /// Number of sockets not handed out.
    pub fn free_sockets(&self) -> u32 {
        self.sockets[0].count_ones()
    }

    fn take_socket(&mut self) -> Option<Socket> {
        for index in 0..8 {
            if self.sockets.get_bit(index) {
                self.sockets.set_bit(index, false);
                return Some(Socket::new(index as u8));
            }
        }
        None
    }

    fn release_socket(&mut self, socket: Socket) {
        self.sockets.set_bit(socket.index.into(), true);
    }

    fn ephemeral_port(&mut self) -> u16 {
        let port = self.next_port;
        self.next_port = self.next_port.checked_add(1).unwrap_or(EPHEMERAL_PORT_START);
        port
    }
}

impl<SpiBus: Bus> TcpClientStack for TcpClient<SpiBus> {
    type TcpSocket = TcpSocket;
    type Error = TcpSocketError<SpiBus::Error>;

    fn socket(&mut self) -> Result<TcpSocket, Self::Error> {
        match self.take_socket() {
            Some(socket) => Ok(TcpSocket {
                socket,
                local_port: 0,
                connecting: false,
                sending: false,
            }),
            None => Err(TcpSocketError::NoMoreSockets),
        }
    }

    fn connect(
        &mut self,
        socket: &mut Self::TcpSocket,
        remote: SocketAddr,
    ) -> nb::Result<(), Self::Error> {
        match remote {
            SocketAddr::V4(remote) => {
                if !socket.connecting {
                    socket.local_port = self.ephemeral_port();
                }
                socket.poll_connect(&mut self.bus, remote)
            }
            SocketAddr::V6(_) => Err(nb::Error::Other(TcpSocketError::UnsupportedAddress)),
        }
    }

    fn send(&mut self, socket: &mut Self::TcpSocket, buffer: &[u8]) -> nb::Result<usize, Self::Error> {
        socket.send(&mut self.bus, buffer)
    }

    fn receive(
        &mut self,
        socket: &mut Self::TcpSocket,
        buffer: &mut [u8],
    ) -> nb::Result<usize, Self::Error> {
        socket.receive(&mut self.bus, buffer)
    }

    fn close(&mut self, mut socket: Self::TcpSocket) -> Result<(), Self::Error> {
        let closed = socket.close(&mut self.bus);
        self.release_socket(socket.socket);
        closed
    }
}

#[cfg(test)]
mod test {
    use embedded_nal::{Ipv4Addr, Ipv6Addr, SocketAddrV6};

    use super::*;
    use crate::bus::MemoryBus;
    use crate::register;

    fn remote() -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 10), 8080))
    }

    fn set_status(bus: &mut MemoryBus, socket: u8, status: socketn::Status) {
        bus.write_frame(socket * 4 + 1, socketn::STATUS, &[status as u8])
            .unwrap();
    }

    #[test]
    fn hands_out_each_socket_once() {
        let mut client = TcpClient::new(MemoryBus::default());
        let mut taken = std::vec::Vec::new();
        for _ in 0..8 {
            taken.push(client.socket().unwrap());
        }
        assert_eq!(client.free_sockets(), 0);
        assert_eq!(client.socket().unwrap_err(), TcpSocketError::NoMoreSockets);

        let socket = taken.pop().unwrap();
        client.close(socket).unwrap();
        assert_eq!(client.free_sockets(), 1);
        assert!(client.socket().is_ok());
    }

    #[test]
    fn connect_completes_once_established() {
        let mut client = TcpClient::new(MemoryBus::default());
        let mut socket = client.socket().unwrap();

        assert_eq!(client.connect(&mut socket, remote()), Err(nb::Error::WouldBlock));
        {
            let bus = &client.bus;
            assert_eq!(bus.frame(register::SOCKET0, socketn::DESTINATION_IP, 4), [192, 168, 1, 10]);
            assert_eq!(bus.frame(register::SOCKET0, socketn::DESTINATION_PORT, 2), 8080_u16.to_be_bytes());
            assert_eq!(bus.frame(register::SOCKET0, socketn::SOURCE_PORT, 2), EPHEMERAL_PORT_START.to_be_bytes());
            assert_eq!(bus.frame(register::SOCKET0, socketn::COMMAND, 1), [socketn::Command::Connect as u8]);
        }

        set_status(&mut client.bus, 0, socketn::Status::SynSent);
        assert_eq!(client.connect(&mut socket, remote()), Err(nb::Error::WouldBlock));

        set_status(&mut client.bus, 0, socketn::Status::Established);
        assert_eq!(client.connect(&mut socket, remote()), Ok(()));
    }

    #[test]
    fn connect_reports_a_timed_out_attempt() {
        let mut client = TcpClient::new(MemoryBus::default());
        let mut socket = client.socket().unwrap();

        assert_eq!(client.connect(&mut socket, remote()), Err(nb::Error::WouldBlock));
        // the chip drops back to CLOSED on ARP or SYN timeout
        set_status(&mut client.bus, 0, socketn::Status::Closed);
        assert_eq!(
            client.connect(&mut socket, remote()),
            Err(nb::Error::Other(TcpSocketError::ConnectionFailed))
        );

        // the next call starts over on a fresh port
        assert_eq!(client.connect(&mut socket, remote()), Err(nb::Error::WouldBlock));
        assert_eq!(
            client.bus.frame(register::SOCKET0, socketn::SOURCE_PORT, 2),
            (EPHEMERAL_PORT_START + 1).to_be_bytes()
        );
    }

    #[test]
    fn connect_keeps_the_port_while_pending() {
        let mut client = TcpClient::new(MemoryBus::default());
        let mut socket = client.socket().unwrap();
        let port = EPHEMERAL_PORT_START.to_be_bytes();

        assert_eq!(client.connect(&mut socket, remote()), Err(nb::Error::WouldBlock));

        // CONNECT not processed yet
        set_status(&mut client.bus, 0, socketn::Status::Init);
        assert_eq!(client.connect(&mut socket, remote()), Err(nb::Error::WouldBlock));
        assert_eq!(client.bus.frame(register::SOCKET0, socketn::SOURCE_PORT, 2), port);

        // an unexpected state reopens the socket on the same port
        set_status(&mut client.bus, 0, socketn::Status::FinWait);
        assert_eq!(client.connect(&mut socket, remote()), Err(nb::Error::WouldBlock));
        assert_eq!(client.bus.frame(register::SOCKET0, socketn::SOURCE_PORT, 2), port);
        assert_eq!(
            client.bus.frame(register::SOCKET0, socketn::COMMAND, 1),
            [socketn::Command::Connect as u8]
        );
    }

    #[test]
    fn connect_completes_when_the_peer_closes_early() {
        let mut client = TcpClient::new(MemoryBus::default());
        let mut socket = client.socket().unwrap();

        assert_eq!(client.connect(&mut socket, remote()), Err(nb::Error::WouldBlock));
        set_status(&mut client.bus, 0, socketn::Status::CloseWait);
        assert_eq!(client.connect(&mut socket, remote()), Ok(()));
        assert_eq!(
            client.bus.frame(register::SOCKET0, socketn::SOURCE_PORT, 2),
            EPHEMERAL_PORT_START.to_be_bytes()
        );
    }

    #[test]
    fn ipv6_is_unsupported() {
        let mut client = TcpClient::new(MemoryBus::default());
        let mut socket = client.socket().unwrap();
        let remote = SocketAddr::V6(SocketAddrV6::new(Ipv6Addr::LOCALHOST, 80, 0, 0));

        assert_eq!(
            client.connect(&mut socket, remote),
            Err(nb::Error::Other(TcpSocketError::UnsupportedAddress))
        );
    }

    #[test]
    fn send_waits_for_the_previous_send() {
        let mut client = TcpClient::new(MemoryBus::default());
        let mut socket = client.socket().unwrap();

        assert_eq!(
            client.send(&mut socket, b"hello"),
            Err(nb::Error::Other(TcpSocketError::NotReady))
        );

        set_status(&mut client.bus, 0, socketn::Status::Established);
        client
            .bus
            .write_frame(register::SOCKET0, socketn::TX_FREE_SIZE, &2048_u16.to_be_bytes())
            .unwrap();
        client
            .bus
            .write_frame(register::SOCKET0, socketn::TX_DATA_WRITE_POINTER, &0xFFFE_u16.to_be_bytes())
            .unwrap();

        assert_eq!(client.send(&mut socket, b"hello"), Ok(5));
        assert_eq!(client.bus.frame(register::SOCKET0_BUFFER_TX, 0xFFFE, 5), b"hello");
        assert_eq!(
            client.bus.frame(register::SOCKET0, socketn::TX_DATA_WRITE_POINTER, 2),
            3_u16.to_be_bytes()
        );

        assert_eq!(client.send(&mut socket, b"world"), Err(nb::Error::WouldBlock));

        client.bus.raise_interrupt(register::SOCKET0, socketn::Interrupt::SendOk as u8);
        assert_eq!(client.send(&mut socket, b"world"), Ok(5));
    }

    #[test]
    fn empty_send_does_not_block_the_next_one() {
        let mut client = TcpClient::new(MemoryBus::default());
        let mut socket = client.socket().unwrap();
        set_status(&mut client.bus, 0, socketn::Status::Established);
        client
            .bus
            .write_frame(register::SOCKET0, socketn::TX_FREE_SIZE, &2048_u16.to_be_bytes())
            .unwrap();

        assert_eq!(client.send(&mut socket, b""), Ok(0));
        assert_eq!(client.bus.frame(register::SOCKET0, socketn::COMMAND, 1), [0]);
        assert_eq!(client.send(&mut socket, b"hello"), Ok(5));
    }

    #[test]
    fn send_truncates_to_free_space() {
        let mut client = TcpClient::new(MemoryBus::default());
        let mut socket = client.socket().unwrap();
        set_status(&mut client.bus, 0, socketn::Status::Established);
        client
            .bus
            .write_frame(register::SOCKET0, socketn::TX_FREE_SIZE, &3_u16.to_be_bytes())
            .unwrap();

        assert_eq!(client.send(&mut socket, b"hello"), Ok(3));
        assert_eq!(client.bus.frame(register::SOCKET0_BUFFER_TX, 0, 3), b"hel");
    }

    #[test]
    fn receive_reads_buffered_data() {
        let mut client = TcpClient::new(MemoryBus::default());
        let mut socket = client.socket().unwrap();
        set_status(&mut client.bus, 0, socketn::Status::Established);

        let mut buffer = [0u8; 16];
        assert_eq!(client.receive(&mut socket, &mut buffer), Err(nb::Error::WouldBlock));

        client
            .bus
            .write_frame(register::SOCKET0, socketn::RECEIVED_SIZE, &4_u16.to_be_bytes())
            .unwrap();
        client
            .bus
            .write_frame(register::SOCKET0, socketn::RX_DATA_READ_POINTER, &0x0100_u16.to_be_bytes())
            .unwrap();
        client
            .bus
            .write_frame(register::SOCKET0_BUFFER_RX, 0x0100, b"pong")
            .unwrap();

        assert_eq!(client.receive(&mut socket, &mut buffer), Ok(4));
        assert_eq!(&buffer[..4], b"pong");
        assert_eq!(
            client.bus.frame(register::SOCKET0, socketn::RX_DATA_READ_POINTER, 2),
            0x0104_u16.to_be_bytes()
        );
        assert_eq!(
            client.bus.frame(register::SOCKET0, socketn::COMMAND, 1),
            [socketn::Command::Receive as u8]
        );
    }
}
