//! Server-rendered HTML pages. The interactive parts of the challenge page live
//! in `static_dir/js/challenge_script.js`; these pages only provide the shell.

use crate::domain::{Label, ScoreReport};
use crate::util::{escape_html, format_significant};

fn layout(prefix: &str, title: &str, body: &str) -> String {
  format!(
    r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>TweetRater · {title}</title>
<link rel="stylesheet" href="{prefix}/css/style.css">
</head>
<body>
<nav>
<a href="{prefix}/">TweetRater</a>
<a href="{prefix}/challenge/">Challenge</a>
<a href="{prefix}/about/">About</a>
</nav>
<main>
{body}
</main>
</body>
</html>
"#,
    title = escape_html(title),
  )
}

/// Glyph for a label, matching the legend on the challenge page.
fn glyph(label: Label) -> &'static str {
  match label {
    Label::Inoffensive => "<span class='glyphicon glyphicon-ok-sign' title='inoffensive'></span>",
    Label::Offensive => "<span class='glyphicon glyphicon-exclamation-sign' title='offensive'></span>",
    Label::HateSpeech => "<span class='glyphicon glyphicon-remove-sign' title='hate speech'></span>",
  }
}

pub fn index_page(prefix: &str) -> String {
  let body = format!(
    r#"<h1>TweetRater</h1>
<p>Type a tweet and the classifier will tell you how offensive it thinks it is.</p>
<form id="rater" action="{prefix}/predict/" method="get">
<textarea name="tweet" rows="3" cols="60"></textarea>
<button type="submit">Rate it</button>
</form>
<ul id="predictions"></ul>
<script src="{prefix}/js/tweetrater_script.js"></script>"#
  );
  layout(prefix, "Home", &body)
}

pub fn challenge_page(prefix: &str, n_training: usize, n_test: usize) -> String {
  let legend: String = Label::ALL
    .iter()
    .map(|l| format!("<li>{} {}</li>", glyph(*l), l.name()))
    .collect();
  let body = format!(
    r#"<h1>Beat the model</h1>
<p>Study a few rated examples, then label the test tweets yourself and compare your accuracy with the classifier's.</p>
<ul class="legend">{legend}</ul>
<section class="training" data-prefix="{prefix}" data-n-training="{n_training}">
<div id="inoffensive" data-rating="0"><h3>Inoffensive</h3><button type="button" class="more-examples">More examples</button><ul class="list-group"></ul></div>
<div id="offensive" data-rating="1"><h3>Offensive</h3><button type="button" class="more-examples">More examples</button><ul class="list-group"></ul></div>
<div id="hatespeech" data-rating="2"><h3>Hate speech</h3><button type="button" class="more-examples">More examples</button><ul class="list-group"></ul></div>
</section>
<form action="{prefix}/results/" method="post" data-n-test="{n_test}">
<ul class="container-tweets"></ul>
<button type="submit">See results</button>
</form>
<script src="{prefix}/js/challenge_script.js"></script>"#
  );
  layout(prefix, "Challenge", &body)
}

pub fn about_page(prefix: &str) -> String {
  let body = r#"<h1>About</h1>
<p>The classifier is a small convolutional network over lemmatized tweet text. It was trained on
crowd-labeled tweets rated as inoffensive, offensive or hate speech.</p>
<p>The challenge compares your labels and the model's labels against the human ratings of the same tweets.</p>"#;
  layout(prefix, "About", body)
}

pub fn results_page(prefix: &str, report: &ScoreReport) -> String {
  let rows: String = report
    .rows
    .iter()
    .map(|r| {
      format!(
        "<tr><td>{}</td><td class='{}'>{}</td><td class='{}'>{}</td><td>{}</td></tr>\n",
        escape_html(&r.text),
        if r.user_correct() { "correct" } else { "wrong" },
        glyph(r.user),
        if r.model_correct() { "correct" } else { "wrong" },
        glyph(r.model),
        glyph(r.truth),
      )
    })
    .collect();
  let body = format!(
    r#"<h1>Results</h1>
<p>Your accuracy: <strong>{user}%</strong></p>
<p>Model accuracy: <strong>{model}%</strong></p>
<table class="results">
<thead><tr><th>Tweet</th><th>You</th><th>Model</th><th>Truth</th></tr></thead>
<tbody>
{rows}</tbody>
</table>
<p><a href="{prefix}/challenge/">Try again</a></p>"#,
    user = format_significant(report.user_accuracy, 4),
    model = format_significant(report.model_accuracy, 4),
  );
  layout(prefix, "Results", &body)
}
