/// Render the (plain, html) bodies for a reminder email.
///
/// One template for every notification kind: headline, message, and a single
/// action button pointing back at the dashboard.
pub fn notification_email(title: &str, message: &str, action_url: &str) -> (String, String) {
    let text = format!("{title}\n\n{message}\n\nOpen your dashboard: {action_url}\n");

    let html = format!(
        r#"<!DOCTYPE html>
<html>
  <body style="margin:0;padding:0;background-color:#f4f5f7;font-family:Helvetica,Arial,sans-serif;">
    <div style="max-width:600px;margin:0 auto;padding:40px 20px;">
      <div style="background:#ffffff;border-radius:12px;padding:40px;border:1px solid #e2e4e8;">
        <div style="margin-bottom:24px;">
          <span style="display:inline-block;width:36px;height:36px;background:#111827;border-radius:10px;color:#ffffff;text-align:center;line-height:36px;font-weight:700;">TF</span>
          <span style="font-size:18px;font-weight:700;color:#111827;margin-left:10px;">TaskFlow</span>
        </div>
        <h1 style="font-size:26px;color:#111827;margin:0 0 14px 0;">{title}</h1>
        <p style="font-size:16px;color:#4b5563;line-height:1.6;margin:0 0 28px 0;">{message}</p>
        <a href="{action_url}" style="display:inline-block;background:#3b82f6;color:#ffffff;padding:14px 28px;border-radius:8px;text-decoration:none;font-weight:700;">Open Dashboard</a>
      </div>
      <p style="font-size:11px;color:#9ca3af;text-align:center;margin-top:20px;">Automated reminder from TaskFlow.</p>
    </div>
  </body>
</html>
"#
    );

    (text, html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bodies_carry_title_message_and_link() {
        let (text, html) =
            notification_email("Upcoming Deadline", "Task \"Ship report\" is due soon.", "http://localhost:5173/dashboard");

        assert!(text.contains("Upcoming Deadline"));
        assert!(text.contains("Ship report"));
        assert!(text.contains("http://localhost:5173/dashboard"));
        assert!(html.contains("Upcoming Deadline"));
        assert!(html.contains("Ship report"));
        assert!(html.contains("http://localhost:5173/dashboard"));
    }
}
