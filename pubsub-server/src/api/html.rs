//! Minimal HTML rendering for the message board pages.

use pubsub_core::Message;

const TITLE: &str = "Pub/Sub message board";

/// Form posting a `message` field to `/publish`.
pub(crate) const PUBLISH_FORM: &str = "<form method='POST' action='/publish'>\
<input required name='message' placeholder='Message'>\
<input type='submit' value='Publish'>\
</form>";

/// The publisher page: just the form.
pub(crate) fn publisher_page() -> String {
    format!("<!DOCTYPE html><title>{TITLE}</title>{PUBLISH_FORM}")
}

/// The subscriber page: one `<li>` per message payload, in buffer order.
pub(crate) fn message_list_page(messages: &[Message], publish_form: bool) -> String {
    let mut page = format!("<!DOCTYPE html><title>{TITLE}</title><h1>{TITLE}</h1>");
    if publish_form {
        page.push_str(PUBLISH_FORM);
    }
    page.push_str("<p>Received messages:</p>\n<ul>\n");
    for message in messages {
        page.push_str(&format!("<li>{}</li>\n", escape(&message.payload_lossy())));
    }
    page.push_str("</ul>\n");
    page
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
