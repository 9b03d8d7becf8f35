//! Embedded page markup
//!
//! The login page is a single fixed document. It is embedded as a const so
//! the binary has no runtime asset directory to locate.

/// The demo login page.
///
/// The markup is the contract the E2E suite asserts against: the document
/// title, the heading, the labelled fields, and the three stub handlers
/// that alert instead of doing anything. Client-side constraint validation
/// (`required`, `type="email"`) is left entirely to the browser, so an
/// invalid submission never reaches the submit handler.
pub const LOGIN_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>frontend</title>
  <style>
    body { font-family: system-ui, sans-serif; display: flex; justify-content: center; padding-top: 10vh; background: #f5f6f8; }
    .card { background: #fff; border: 1px solid #dde0e4; border-radius: 8px; padding: 2rem; width: 22rem; }
    h1 { font-size: 1.4rem; margin-top: 0; }
    label { display: block; margin-top: 1rem; font-size: 0.9rem; }
    input[type="email"], input[type="password"] { width: 100%; box-sizing: border-box; margin-top: 0.25rem; padding: 0.5rem; }
    .remember { display: flex; align-items: center; gap: 0.5rem; margin-top: 1rem; }
    .remember label { margin-top: 0; }
    button { margin-top: 1.25rem; width: 100%; padding: 0.6rem; }
    .links { margin-top: 1rem; display: flex; justify-content: space-between; font-size: 0.9rem; }
  </style>
</head>
<body>
  <main class="card">
    <h1>Welcome back</h1>
    <form id="login-form">
      <label for="email">Email</label>
      <input id="email" name="email" type="email" autocomplete="email" required>
      <label for="password">Password</label>
      <input id="password" name="password" type="password" autocomplete="current-password" required>
      <div class="remember">
        <input id="remember" name="remember" type="checkbox">
        <label for="remember">Remember me</label>
      </div>
      <button type="submit">Sign in</button>
    </form>
    <div class="links">
      <a href="#" id="forgot-password">Forgot password?</a>
      <a href="#" id="sign-up">Sign up</a>
    </div>
  </main>
  <script>
    const form = document.getElementById('login-form');
    form.addEventListener('submit', (event) => {
      event.preventDefault();
      const email = document.getElementById('email').value;
      alert('Login attempted with email: ' + email);
    });
    document.getElementById('sign-up').addEventListener('click', (event) => {
      event.preventDefault();
      alert('Sign up functionality not implemented');
    });
    document.getElementById('forgot-password').addEventListener('click', (event) => {
      event.preventDefault();
      alert('Password reset functionality not implemented');
    });
  </script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_carries_title_and_heading() {
        assert!(LOGIN_HTML.contains("<title>frontend</title>"));
        assert!(LOGIN_HTML.contains("<h1>Welcome back</h1>"));
    }

    #[test]
    fn fields_are_labelled_and_required() {
        assert!(LOGIN_HTML.contains(r#"<label for="email">Email</label>"#));
        assert!(LOGIN_HTML.contains(r#"<label for="password">Password</label>"#));
        assert!(LOGIN_HTML.contains(r#"<label for="remember">Remember me</label>"#));
        // Both credential fields participate in native constraint validation
        assert!(LOGIN_HTML.contains(r#"type="email" autocomplete="email" required"#));
        assert!(LOGIN_HTML.contains(r#"type="password" autocomplete="current-password" required"#));
    }

    #[test]
    fn stub_handlers_alert_with_fixed_messages() {
        assert!(LOGIN_HTML.contains("'Login attempted with email: ' + email"));
        assert!(LOGIN_HTML.contains("Sign up functionality not implemented"));
        assert!(LOGIN_HTML.contains("Password reset functionality not implemented"));
    }
}
