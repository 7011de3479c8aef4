#[macro_use]
extern crate rocket;

#[launch]
fn rocket() -> _ {
    let rocket = bragboard_api::rocket();
    log::info!("starting BragBoard API server");
    rocket
}
