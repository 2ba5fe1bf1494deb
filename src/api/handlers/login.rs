use axum::response::Html;

const LOGIN_PAGE: &str = r#"<!doctype html>
<html lang="es">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>PuraBombilla - Admin</title>
  <link rel="stylesheet" href="/static/app.css">
</head>
<body>
  <main class="login">
    <h1>Panel de administración</h1>
    <form id="login-form">
      <label for="id-token">Token de identidad</label>
      <textarea id="id-token" name="idToken" required></textarea>
      <button type="submit">Ingresar</button>
    </form>
    <p id="login-error" class="error" hidden>No se pudo iniciar sesión.</p>
  </main>
  <script>
    document.getElementById("login-form").addEventListener("submit", async (event) => {
      event.preventDefault();
      const idToken = new FormData(event.target).get("idToken");
      const response = await fetch("/api/session", {
        method: "POST",
        headers: { "content-type": "application/json" },
        body: JSON.stringify({ idToken }),
      });
      if (response.ok) {
        window.location.assign("/admin");
      } else {
        document.getElementById("login-error").hidden = false;
      }
    });
  </script>
</body>
</html>
"#;

#[utoipa::path(
    get,
    path= "/login",
    responses (
        (status = 200, description = "Login page", content_type = "text/html"),
        (status = 307, description = "Already signed in; redirect to /admin"),
    ),
    tag= "session"
)]
// axum handler for the login page; the gate redirects valid sessions before this runs
pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}
