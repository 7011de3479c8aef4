use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Status;
use rocket::{Data, Request, Response};
use std::time::Instant;

use crate::auth::guards::Principal;

/// Fairing to log one line per HTTP request with timing and the caller's id
pub struct RequestLogger;

#[rocket::async_trait]
impl Fairing for RequestLogger {
    fn info(&self) -> Info {
        Info {
            name: "Request Logger",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        request.local_cache(Instant::now);
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let duration = request.local_cache(Instant::now).elapsed();
        let user = match request.local_cache(Principal::default).0 {
            Some(id) => format!(" user={id}"),
            None => String::new(),
        };

        let method = request.method();
        let uri = request.uri();
        let status = response.status();
        let millis = duration.as_secs_f64() * 1000.0;

        if status == Status::Unauthorized || status == Status::Forbidden {
            log::warn!("{} {} -> {} ({:.2}ms){}", method, uri, status.code, millis, user);
        } else {
            log::info!("{} {} -> {} ({:.2}ms){}", method, uri, status.code, millis, user);
        }
    }
}
