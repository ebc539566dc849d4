use std::net::{IpAddr, SocketAddr, TcpStream};
use std::time::Duration;

use net2::{TcpBuilder, TcpStreamExt};
use url::Url;

use crate::error::{InvalidUrl, Result};

/// the tcp configuration for a connection
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// read timeout of the socket, blocking forever if is None
    pub read_timeout: Option<Duration>,
    /// write timeout of the socket, blocking forever if is None
    pub write_timeout: Option<Duration>,
    /// if is None `SO_KEEPALIVE` is left unset
    pub keep_alive_timeout: Option<Duration>,
    /// if is None the system picks the local address
    pub local_address: Option<IpAddr>,
    /// not delay
    pub nodelay: bool,
    /// tcp connector will reuse ip address and port if `reuse_address` is true
    pub reuse_address: bool,
    /// tcp send buffer size default size if is None
    pub send_buffer_size: Option<usize>,
    /// tcp received buffer size default size if is None
    pub recv_buffer_size: Option<usize>,
    ///
    pub ttl: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            read_timeout: None,
            write_timeout: None,
            keep_alive_timeout: None,
            local_address: None,
            nodelay: true,
            reuse_address: false,
            send_buffer_size: None,
            recv_buffer_size: None,
            ttl: 64,
        }
    }
}

/// Opens TCP streams configured by a [`HttpConfig`].
#[derive(Debug, Clone, Default)]
pub struct HttpConnector {
    config: HttpConfig,
}

impl HttpConnector {
    /// Construct a new HttpConnector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a new HttpConnector use given http config
    pub fn with_http_config(config: HttpConfig) -> Self {
        Self { config }
    }

    /// the configuration streams are opened with
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Set that all sockets have `SO_KEEPALIVE` set with the supplied duration.
    ///
    /// If `None`, the option will not be set.
    ///
    /// Default is `None`.
    #[inline]
    pub fn set_keepalive(&mut self, dur: Option<Duration>) {
        self.config.keep_alive_timeout = dur;
    }

    ///
    #[inline]
    pub fn set_ttl(&mut self, ttl: u32) {
        self.config.ttl = ttl;
    }

    /// Set that all sockets have `SO_NODELAY` set to the supplied value `nodelay`.
    ///
    /// Default is `true`, pipelined requests are small and latency bound.
    #[inline]
    pub fn set_nodelay(&mut self, nodelay: bool) {
        self.config.nodelay = nodelay;
    }

    /// Set that all sockets are bound to the configured address before connection.
    ///
    /// If `None`, the sockets will not be bound.
    ///
    /// Default is `None`.
    #[inline]
    pub fn set_local_address(&mut self, addr: Option<IpAddr>) {
        self.config.local_address = addr;
    }

    /// Sets the value of the SO_SNDBUF option on the socket.
    #[inline]
    pub fn set_send_buffer_size(&mut self, size: Option<usize>) {
        self.config.send_buffer_size = size;
    }

    /// Sets the value of the SO_RCVBUF option on the socket.
    #[inline]
    pub fn set_recv_buffer_size(&mut self, size: Option<usize>) {
        self.config.recv_buffer_size = size;
    }

    /// Set the read and write timeouts of opened sockets.
    ///
    /// Default is `None`.
    #[inline]
    pub fn set_timeouts(&mut self, read: Option<Duration>, write: Option<Duration>) {
        self.config.read_timeout = read;
        self.config.write_timeout = write;
    }

    /// Open a configured stream to `socket_addr`.
    pub fn connect(&self, socket_addr: &SocketAddr) -> Result<TcpStream> {
        let config = &self.config;
        // use net2 crate to build Tcp Stream
        let tcp_builder = match socket_addr {
            SocketAddr::V4(_) => TcpBuilder::new_v4(),
            SocketAddr::V6(_) => TcpBuilder::new_v6(),
        }?;
        //  Set value for the `SO_REUSEADDR` option on this socket
        if config.reuse_address {
            tcp_builder.reuse_address(true)?;
        }
        tcp_builder.ttl(config.ttl)?;
        if let Some(local) = config.local_address {
            // let system chose port
            tcp_builder.bind(SocketAddr::new(local, 0))?;
        }
        debug!("connecting to {}", socket_addr);
        let stream = tcp_builder.connect(socket_addr)?;
        stream.set_read_timeout(config.read_timeout)?;
        stream.set_write_timeout(config.write_timeout)?;
        stream.set_nodelay(config.nodelay)?;
        TcpStreamExt::set_keepalive(&stream, config.keep_alive_timeout)?;
        if let Some(size) = config.send_buffer_size {
            TcpStreamExt::set_send_buffer_size(&stream, size)?;
        }
        if let Some(size) = config.recv_buffer_size {
            TcpStreamExt::set_recv_buffer_size(&stream, size)?;
        }
        Ok(stream)
    }
}

/// get socket address from given url
pub fn socket_addr(url: &Url) -> Result<SocketAddr> {
    let scheme = url.scheme();
    // get request host and port
    let addr = url.socket_addrs(|| match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    })?.into_iter()
        .next()
        .ok_or_else(|| InvalidUrl::new(format!("{} does not resolve", url)))?;
    Ok(addr)
}

/// the `Host` header value for `url`: its host, plus the port when it is
/// not the default one of the scheme
pub fn host_header(url: &Url) -> Result<String> {
    let host = url.host_str().ok_or_else(|| InvalidUrl::new(format!("{} has no host", url)))?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_owned(),
    })
}
