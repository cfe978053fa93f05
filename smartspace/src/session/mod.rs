pub mod client;
pub mod forms;
pub mod gateway;
pub mod provider;

pub use client::AuthClient;
pub use forms::{ForgotPasswordForm, SignInForm, SignUpForm};
pub use gateway::{LogNavigator, Navigator, SessionGateway, SessionSubscription};
pub use provider::IdentityProvider;
