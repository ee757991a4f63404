// src/server/client.rs

//! Browser side of live reload.

use super::CLIENT_SCRIPT_PATH;

/// Reconnecting websocket client. `reload` reloads the page; `inject`
/// re-fetches the listed stylesheets and falls back to a reload when none of
/// them is linked from the page.
pub const CLIENT_SCRIPT: &str = r#"(function () {
  var url = (location.protocol === "https:" ? "wss://" : "ws://") + location.host + "/__livereload";

  function normalize(href) {
    return href.split("?")[0].replace(/^https?:\/\/[^\/]+/, "").replace(/^\.?\//, "");
  }

  function inject(paths) {
    var swapped = false;
    document.querySelectorAll('link[rel="stylesheet"]').forEach(function (link) {
      var href = normalize(link.getAttribute("href") || "");
      if (paths.indexOf(href) !== -1) {
        link.href = "/" + href + "?livereload=" + Date.now();
        swapped = true;
      }
    });
    if (!swapped) {
      location.reload();
    }
  }

  function connect() {
    var socket = new WebSocket(url);
    socket.onmessage = function (message) {
      var event = JSON.parse(message.data);
      if (event.type === "inject") {
        inject(event.data.paths);
      } else {
        location.reload();
      }
    };
    socket.onclose = function () {
      setTimeout(connect, 1000);
    };
  }

  connect();
})();
"#;

/// Insert the client script tag before the last `</body>`, or append it.
pub fn inject_client(html: &str) -> String {
    let tag = format!(r#"<script src="{CLIENT_SCRIPT_PATH}"></script>"#);
    match html.to_ascii_lowercase().rfind("</body>") {
        Some(idx) => {
            let mut out = String::with_capacity(html.len() + tag.len());
            out.push_str(&html[..idx]);
            out.push_str(&tag);
            out.push_str(&html[idx..]);
            out
        }
        None => format!("{html}{tag}"),
    }
}
