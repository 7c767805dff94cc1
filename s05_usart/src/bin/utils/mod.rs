pub mod usart_line;
