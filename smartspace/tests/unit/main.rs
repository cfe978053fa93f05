mod support;
mod test_auth_client;
mod test_devices;
mod test_gateway;
mod test_routines;
mod test_server;
mod test_session_refresh;
