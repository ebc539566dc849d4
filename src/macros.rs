/// macro for http header
/// # Usage
/// ```
/// use std::io::Cursor;
/// use httpipe::{http_header, Connection};
///
/// let headers = http_header! {
///     "Accept" => "text/html",
///     "user_agent" => "httpipe",
/// };
/// let mut conn = Connection::with_headers(Cursor::new(Vec::new()), "www.example.com", headers).unwrap();
/// conn.get("/").unwrap();
/// ```
#[macro_export]
macro_rules! http_header {

    (@item $($x:tt)*) => (());

    (@count $($key:expr),*) => (<[()]>::len(&[$($crate::http_header!(@item $key)),*]));

    ($($key:expr => $value:expr),*$(,)*) => {
        {
            let len = $crate::http_header!(@count $($key),*);
            let mut __inner_headers: ::std::vec::Vec<(::std::string::String, ::std::string::String)> = ::std::vec::Vec::with_capacity(len);
            $(
                __inner_headers.push(($key.to_string(), $value.to_string()));
            )*
            __inner_headers
        }
    };
}
