pub use connection::Connection;

mod connection;

// A pipelined exchange takes the following steps
// for example GET /a then GET /b on http://www.example.com:8080/
// the client writes both requests at once, remembering them in order
// the server answers them one after the other on the same stream
// reading the first response head pairs it with the first request,
// its body has to be read (or is skipped) before the second head can be parsed
// once a response says so, the client closes the connection.
