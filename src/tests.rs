mod fake;
mod pipeline;
mod publish;
